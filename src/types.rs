//! Core type definitions for payment-method resolution.
//!
//! This module contains the data structures exchanged between the invoice
//! pipeline and the rail handlers: rail configurations, the read-only invoice
//! view, and the settlement details each rail produces.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies a settlement rail. Used as the dispatch key in the handler
/// registry.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RailKind {
    /// Direct on-chain transfer to a freshly derived deposit address.
    OnChain,
    /// Real-time payment-channel network (bounded by channel liquidity).
    Channel,
}

impl fmt::Display for RailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RailKind::OnChain => write!(f, "on-chain"),
            RailKind::Channel => write!(f, "channel"),
        }
    }
}

/// Address-derivation parameters for the on-chain rail.
///
/// Opaque to this crate; the wallet service interprets the scheme string and
/// guarantees a fresh, previously-unused address per reservation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DerivationConfig {
    /// Derivation scheme descriptor (e.g. an xpub-based descriptor).
    #[serde(rename = "derivationScheme")]
    pub derivation_scheme: String,
}

/// Connection parameters for a payment-channel node.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChannelNodeConfig {
    /// Connection string understood by the channel client factory
    /// (e.g. `type=clightning;server=unix://...`).
    #[serde(rename = "connectionString")]
    pub connection_string: String,
}

/// Rail-specific configuration attached to an invoice's requested payment
/// method. Immutable once attached.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "rail", rename_all = "kebab-case")]
pub enum PaymentRailConfig {
    /// On-chain rail with its derivation configuration.
    OnChain(DerivationConfig),
    /// Payment-channel rail with its node connection configuration.
    Channel(ChannelNodeConfig),
}

impl PaymentRailConfig {
    /// The rail this configuration belongs to.
    pub fn rail_kind(&self) -> RailKind {
        match self {
            PaymentRailConfig::OnChain(_) => RailKind::OnChain,
            PaymentRailConfig::Channel(_) => RailKind::Channel,
        }
    }
}

/// Network context a handler operates against.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Network {
    /// Short network code (e.g. "BTC", "LTC") used as the sync-dashboard key.
    pub code: String,
    /// Human-readable network name.
    pub name: String,
}

impl Network {
    /// Creates a network context.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// Read-only view of an invoice, owned by the invoice subsystem.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Invoice {
    /// Order identifier from the upstream shop.
    #[serde(rename = "orderId")]
    pub order_id: String,
    /// Requested price in the reference (fiat) currency.
    pub price: Decimal,
    /// Exchange rate attached to the invoice's payment method
    /// (reference units per settlement unit).
    pub rate: Decimal,
    /// Moment the invoice stops being payable.
    #[serde(rename = "expirationTime")]
    pub expiration_time: DateTime<Utc>,
    /// Optional item description for the payment-request template.
    #[serde(rename = "itemDescription", skip_serializing_if = "Option::is_none")]
    pub item_description: Option<String>,
}

/// Store configuration relevant to payment-request rendering.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct StoreConfig {
    /// Display name of the store, if configured.
    #[serde(rename = "storeName", skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,
    /// Description template for channel payment requests. Recognized
    /// placeholders: `{StoreName}`, `{ItemDescription}`, `{OrderId}`
    /// (matched case-insensitively).
    #[serde(rename = "descriptionTemplate")]
    pub description_template: String,
}

/// A fee rate in satoshis per size-unit.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeRate {
    /// Satoshis charged per size-unit (virtual byte).
    #[serde(rename = "satPerUnit")]
    pub sat_per_unit: u64,
}

impl FeeRate {
    /// Creates a fee rate from a sat/size-unit value.
    pub fn per_unit(sat_per_unit: u64) -> Self {
        Self { sat_per_unit }
    }

    /// Total fee for a transaction of `size_units` size-units.
    pub fn fee(&self, size_units: u64) -> u64 {
        self.sat_per_unit.saturating_mul(size_units)
    }
}

/// Settlement details for the on-chain rail.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OnChainDetails {
    /// Freshly reserved deposit address the payer sends to.
    #[serde(rename = "depositAddress")]
    pub deposit_address: String,
    /// Fee rate used for the estimate.
    #[serde(rename = "feeRate")]
    pub fee_rate: FeeRate,
    /// Conservative display estimate for a standard-size transaction,
    /// in satoshis. Not the final settlement fee.
    #[serde(rename = "estimatedFee")]
    pub estimated_fee: u64,
}

/// Settlement details for the payment-channel rail.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChannelDetails {
    /// Encoded payment request the payer settles against.
    #[serde(rename = "paymentRequest")]
    pub payment_request: String,
    /// Identifier of the generated request.
    #[serde(rename = "requestId")]
    pub request_id: String,
    /// String form of the verified node identity (`pubkey@host:port`).
    #[serde(rename = "nodeIdentity")]
    pub node_identity: String,
}

/// Result of a handler invocation, consumed by the invoice pipeline for
/// display and persistence. Created once per invocation; immutable; only
/// returned after all liveness checks for its rail have passed.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "rail", rename_all = "kebab-case")]
pub enum PaymentMethodDetails {
    /// On-chain deposit details.
    OnChain(OnChainDetails),
    /// Channel payment-request details.
    Channel(ChannelDetails),
}

impl PaymentMethodDetails {
    /// The rail these details were produced for.
    pub fn rail_kind(&self) -> RailKind {
        match self {
            PaymentMethodDetails::OnChain(_) => RailKind::OnChain,
            PaymentMethodDetails::Channel(_) => RailKind::Channel,
        }
    }
}

/// Endpoint identity of a payment-channel node, as verified by the node
/// liveness check.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    /// Node public key.
    #[serde(rename = "publicKey")]
    pub public_key: String,
    /// Public host of the node (IP literal or DNS name).
    pub host: String,
    /// Peer-to-peer port.
    pub port: u16,
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.public_key, self.host, self.port)
    }
}

impl FromStr for NodeIdentity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (public_key, endpoint) = s
            .split_once('@')
            .ok_or_else(|| format!("missing '@' in node identity '{}'", s))?;
        let (host, port) = endpoint
            .rsplit_once(':')
            .ok_or_else(|| format!("missing port in node identity '{}'", s))?;
        let port = port
            .parse::<u16>()
            .map_err(|e| format!("invalid port in node identity '{}': {}", s, e))?;
        if public_key.is_empty() || host.is_empty() {
            return Err(format!("empty public key or host in node identity '{}'", s));
        }
        Ok(Self {
            public_key: public_key.to_string(),
            host: host.to_string(),
            port,
        })
    }
}

/// Chain summary reported by the full-node sync dashboard (read-only).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainSummary {
    /// Best chain height known to the full node.
    #[serde(rename = "chainHeight")]
    pub chain_height: u32,
}

/// Identity and sync status reported by a payment-channel node.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChannelNodeInfo {
    /// The node's public key.
    #[serde(rename = "nodeId")]
    pub node_id: String,
    /// Public network address, if one is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Peer-to-peer port.
    #[serde(rename = "p2pPort")]
    pub p2p_port: u16,
    /// The node's view of the chain height.
    #[serde(rename = "blockHeight")]
    pub block_height: u32,
}

/// A generated payment-channel request.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChannelRequest {
    /// Encoded form handed to the payer.
    pub encoded: String,
    /// Identifier of the request at the node.
    pub id: String,
}
