//! External collaborator contracts.
//!
//! This crate coordinates settlement rails but implements none of the
//! underlying infrastructure. Each dependency is modeled as an object-safe
//! async trait so the invoice pipeline can pass concrete capabilities
//! explicitly into each handler invocation; there is no process-wide service
//! state. Failures are reported through [`ServiceError`] and re-wrapped as
//! [`RailUnavailable`](crate::errors::RailUnavailable) by callers.

use crate::errors::ServiceError;
use crate::types::{
    ChainSummary, ChannelNodeConfig, ChannelNodeInfo, ChannelRequest, DerivationConfig, FeeRate,
    Network,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

/// Blockchain availability oracle (explorer-backed).
#[async_trait]
pub trait ExplorerProvider: Send + Sync {
    /// Whether the explorer considers the target network usable.
    async fn is_available(&self, network: &Network) -> bool;
}

/// Fee-rate estimation service for the on-chain rail.
#[async_trait]
pub trait FeeRateProvider: Send + Sync {
    /// Current fee-rate estimate for the network.
    async fn get_fee_rate(&self, network: &Network) -> Result<FeeRate, ServiceError>;
}

/// Wallet address-reservation service.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Reserves a fresh, previously-unused deposit address derived from the
    /// given configuration. Every call yields a new address, so retrying a
    /// failed handler invocation is safe.
    async fn reserve_address(&self, derivation: &DerivationConfig) -> Result<String, ServiceError>;
}

/// Full-node synchronization dashboard.
#[async_trait]
pub trait SyncDashboard: Send + Sync {
    /// Returns the chain summary when the full node backing `network_code`
    /// is fully synchronized, `None` otherwise.
    async fn is_fully_synced(&self, network_code: &str) -> Option<ChainSummary>;
}

/// A connected payment-channel node client.
#[async_trait]
pub trait ChannelClient: Send + Sync {
    /// Queries the node for its identity and sync status.
    async fn get_info(&self) -> Result<ChannelNodeInfo, ServiceError>;

    /// Asks the node to generate a payment request for `amount` settlement
    /// units, valid for `expiry`.
    async fn create_request(
        &self,
        amount: Decimal,
        description: &str,
        expiry: Duration,
    ) -> Result<ChannelRequest, ServiceError>;
}

/// Factory producing [`ChannelClient`]s for a given rail configuration.
pub trait ChannelClientFactory: Send + Sync {
    /// Creates a client for the node described by `config` on `network`.
    fn create_client(
        &self,
        config: &ChannelNodeConfig,
        network: &Network,
    ) -> Arc<dyn ChannelClient>;
}
