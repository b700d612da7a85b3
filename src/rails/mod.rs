//! Rail handler implementations.
//!
//! This module contains the trait definition for settlement-rail handlers and
//! one implementation per rail, dispatched through a registry keyed by
//! [`RailKind`] so the invoice pipeline never touches a concrete handler
//! type.

pub mod channel;
pub mod onchain;

use crate::errors::{RailUnavailable, Result};
use crate::types::{Invoice, Network, PaymentMethodDetails, PaymentRailConfig, RailKind, StoreConfig};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Trait implemented by every settlement-rail handler.
///
/// A handler turns an invoice and its rail configuration into the concrete
/// instructions a payer needs, enforcing that the rail's infrastructure is
/// usable first. A handler invocation is terminal: there is no retry inside
/// the handler, and a fresh invocation produces fresh artifacts (a new
/// address or a new request), never reuse of failed ones.
#[async_trait]
pub trait PaymentHandler: Send + Sync {
    /// The rail this handler serves.
    fn rail_kind(&self) -> RailKind;

    /// Produces settlement details for the invoice, or fails with
    /// [`RailUnavailable`] when any liveness or availability check for this
    /// rail does not pass. Partial or stale details are never returned.
    async fn create_details(
        &self,
        config: &PaymentRailConfig,
        invoice: &Invoice,
        store: &StoreConfig,
        network: &Network,
    ) -> Result<PaymentMethodDetails>;
}

/// Lookup of rail handlers keyed by [`RailKind`].
///
/// The invoice pipeline registers one handler per rail at startup and then
/// dispatches by the rail kind carried in the payment-method configuration.
/// Multiple resolutions (for different invoices or rails) proceed fully in
/// parallel; the registry holds no per-invocation state.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<RailKind, Arc<dyn PaymentHandler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under its rail kind, replacing any previous
    /// handler for that rail.
    pub fn register(&mut self, handler: Arc<dyn PaymentHandler>) {
        self.handlers.insert(handler.rail_kind(), handler);
    }

    /// Returns the handler for a rail kind, if one is registered.
    pub fn get(&self, kind: RailKind) -> Option<Arc<dyn PaymentHandler>> {
        self.handlers.get(&kind).cloned()
    }

    /// Resolves the invoice's requested payment method: dispatches to the
    /// handler matching the configuration's rail and invokes it.
    pub async fn resolve(
        &self,
        config: &PaymentRailConfig,
        invoice: &Invoice,
        store: &StoreConfig,
        network: &Network,
    ) -> Result<PaymentMethodDetails> {
        let kind = config.rail_kind();
        let handler = self
            .get(kind)
            .ok_or_else(|| RailUnavailable::new(format!("no handler registered for {} rail", kind)))?;
        handler.create_details(config, invoice, store, network).await
    }
}
