//! Handler for the on-chain settlement rail.
//!
//! Produces a freshly reserved deposit address and a conservative fee
//! estimate. The fee-rate fetch and the address reservation hit different
//! services with no data dependency, so they are launched concurrently and
//! joined before the details are assembled; total latency is bounded by the
//! slower of the two, not their sum.

use crate::errors::{RailUnavailable, Result};
use crate::rails::PaymentHandler;
use crate::services::{ExplorerProvider, FeeRateProvider, WalletProvider};
use crate::types::{
    Invoice, Network, OnChainDetails, PaymentMethodDetails, PaymentRailConfig, RailKind,
    StoreConfig,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Assumed size of a standard transaction, in size-units. The estimated fee
/// shown to the payer is the current rate applied to this size; the final
/// settlement fee depends on the actual transaction.
const STANDARD_TX_SIZE_UNITS: u64 = 100;

/// Handler producing deposit details for the on-chain rail.
pub struct OnChainHandler {
    explorer: Arc<dyn ExplorerProvider>,
    fees: Arc<dyn FeeRateProvider>,
    wallet: Arc<dyn WalletProvider>,
}

impl OnChainHandler {
    /// Creates a handler over the given explorer, fee, and wallet services.
    pub fn new(
        explorer: Arc<dyn ExplorerProvider>,
        fees: Arc<dyn FeeRateProvider>,
        wallet: Arc<dyn WalletProvider>,
    ) -> Self {
        Self {
            explorer,
            fees,
            wallet,
        }
    }
}

#[async_trait]
impl PaymentHandler for OnChainHandler {
    fn rail_kind(&self) -> RailKind {
        RailKind::OnChain
    }

    async fn create_details(
        &self,
        config: &PaymentRailConfig,
        _invoice: &Invoice,
        _store: &StoreConfig,
        network: &Network,
    ) -> Result<PaymentMethodDetails> {
        let derivation = match config {
            PaymentRailConfig::OnChain(derivation) => derivation,
            PaymentRailConfig::Channel(_) => {
                return Err(RailUnavailable::new(
                    "channel configuration passed to the on-chain handler",
                ))
            }
        };

        if !self.explorer.is_available(network).await {
            return Err(RailUnavailable::new("full node not available"));
        }

        // Independent I/O calls to different services; join, order-free.
        let (fee_rate, deposit_address) = tokio::try_join!(
            self.fees.get_fee_rate(network),
            self.wallet.reserve_address(derivation),
        )
        .map_err(|e| {
            RailUnavailable::with_source(format!("on-chain rail unavailable ({})", e), e)
        })?;

        let estimated_fee = fee_rate.fee(STANDARD_TX_SIZE_UNITS);
        debug!(
            network = %network.code,
            address = %deposit_address,
            estimated_fee,
            "on-chain payment details created"
        );

        Ok(PaymentMethodDetails::OnChain(OnChainDetails {
            deposit_address,
            fee_rate,
            estimated_fee,
        }))
    }
}
