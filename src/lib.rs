//! # multirail
//!
//! Payment-method resolution for a multi-rail payment processor.
//!
//! Given an invoice and a customer-selected settlement rail, this crate
//! produces the concrete instructions a payer needs (a fresh deposit address
//! for the on-chain rail, or a signed payment request for the payment-channel
//! rail) while enforcing that the underlying settlement infrastructure is
//! actually usable right now.
//!
//! ## Architecture
//!
//! - **Handlers**: each rail implements [`rails::PaymentHandler`]; the
//!   invoice pipeline dispatches through a [`rails::HandlerRegistry`] keyed
//!   by [`RailKind`] without knowing concrete handler types.
//! - **Liveness**: the channel rail composes a [`health::NodeVerifier`]
//!   (sync-status, deadline-bounded info query, public address, block-height
//!   gap) with request generation; [`health::probe_connectivity`] separately
//!   proves raw TCP reachability with DNS fallback.
//! - **Capabilities**: all external infrastructure (explorer, fee
//!   estimator, wallet, sync dashboard, channel clients) is passed in as
//!   [`services`] trait objects per invocation; there is no process-wide
//!   service state.
//!
//! Every failure surfaces as a single typed error, [`RailUnavailable`]:
//! "this rail cannot be offered right now". Handlers never retry; callers
//! may safely re-invoke, producing fresh artifacts each attempt.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use multirail::rails::{HandlerRegistry, onchain::OnChainHandler};
//! use multirail::fee::HttpFeeRateProvider;
//! # use multirail::services::{ExplorerProvider, WalletProvider};
//! # use std::sync::Arc;
//!
//! # fn wire(explorer: Arc<dyn ExplorerProvider>, wallet: Arc<dyn WalletProvider>) {
//! let mut registry = HandlerRegistry::new();
//! registry.register(Arc::new(OnChainHandler::new(
//!     explorer,
//!     Arc::new(HttpFeeRateProvider::new()),
//!     wallet,
//! )));
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod errors;
pub mod fee;
pub mod health;
pub mod rails;
pub mod services;
pub mod timeout;
pub mod types;

// Re-export commonly used items
pub use errors::{RailUnavailable, Result, ServiceError};
pub use types::{
    ChainSummary, ChannelDetails, ChannelNodeConfig, ChannelNodeInfo, ChannelRequest,
    DerivationConfig, FeeRate, Invoice, Network, NodeIdentity, OnChainDetails,
    PaymentMethodDetails, PaymentRailConfig, RailKind, StoreConfig,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rail_kind_display() {
        assert_eq!(RailKind::OnChain.to_string(), "on-chain");
        assert_eq!(RailKind::Channel.to_string(), "channel");
    }

    #[test]
    fn test_reexports_are_accessible() {
        let _ = RailUnavailable::new("check");
        let _ = FeeRate::per_unit(1);
        let _ = rails::HandlerRegistry::new();
    }
}
