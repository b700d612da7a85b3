//! Handler for the payment-channel settlement rail.
//!
//! Produces a payment request against a channel node, composing the node
//! liveness check with request generation. The liveness check does not depend
//! on any invoice-specific value, so it is spawned up front and only joined
//! at the end; a liveness failure supersedes a successfully generated request
//! (a request against an unhealthy node must not be handed to a payer).

use crate::errors::{RailUnavailable, Result};
use crate::health::NodeVerifier;
use crate::rails::PaymentHandler;
use crate::services::ChannelClientFactory;
use crate::types::{
    ChannelDetails, Invoice, Network, PaymentMethodDetails, PaymentRailConfig, RailKind,
    StoreConfig,
};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Handler producing payment requests for the channel rail.
pub struct ChannelHandler {
    verifier: NodeVerifier,
    clients: Arc<dyn ChannelClientFactory>,
}

impl ChannelHandler {
    /// Creates a handler over the given node verifier and client factory.
    pub fn new(verifier: NodeVerifier, clients: Arc<dyn ChannelClientFactory>) -> Self {
        Self { verifier, clients }
    }
}

#[async_trait]
impl PaymentHandler for ChannelHandler {
    fn rail_kind(&self) -> RailKind {
        RailKind::Channel
    }

    async fn create_details(
        &self,
        config: &PaymentRailConfig,
        invoice: &Invoice,
        store: &StoreConfig,
        network: &Network,
    ) -> Result<PaymentMethodDetails> {
        let node_config = match config {
            PaymentRailConfig::Channel(node_config) => node_config,
            PaymentRailConfig::OnChain(_) => {
                return Err(RailUnavailable::new(
                    "on-chain configuration passed to the channel handler",
                ))
            }
        };

        // The liveness check is independent of the invoice; run it while the
        // request is prepared and join at the end.
        let liveness = {
            let verifier = self.verifier.clone();
            let node_config = node_config.clone();
            let network = network.clone();
            tokio::spawn(async move { verifier.verify(&node_config, &network).await })
        };

        let due = due_amount(invoice)?;
        let expiry = remaining_validity(invoice);
        let description = render_description(&store.description_template, store, invoice);

        let client = self.clients.create_client(node_config, network);
        let request = client
            .create_request(due, &description, expiry)
            .await
            .map_err(|e| {
                RailUnavailable::with_source(
                    format!("impossible to create the payment request ({})", e),
                    e,
                )
            })?;

        let identity = liveness
            .await
            .map_err(|e| RailUnavailable::new(format!("node liveness check aborted ({})", e)))??;

        debug!(
            order_id = %invoice.order_id,
            request_id = %request.id,
            node = %identity,
            "channel payment details created"
        );

        Ok(PaymentMethodDetails::Channel(ChannelDetails {
            payment_request: request.encoded,
            request_id: request.id,
            node_identity: identity.to_string(),
        }))
    }
}

/// Amount due in settlement units: reference price divided by the exchange
/// rate, rounded up to 8 fractional digits. Rounding never goes down, so the
/// payer is never under-charged.
fn due_amount(invoice: &Invoice) -> Result<Decimal> {
    let raw = invoice
        .price
        .checked_div(invoice.rate)
        .ok_or_else(|| RailUnavailable::new("no exchange rate available for the payment method"))?;
    Ok(raw.round_dp_with_strategy(8, RoundingStrategy::AwayFromZero))
}

/// Remaining validity window of the invoice, clamped to a minimum of one
/// second. An invoice expiring at the instant of request creation still gets
/// a request rather than failing outright.
fn remaining_validity(invoice: &Invoice) -> Duration {
    let remaining = invoice.expiration_time.signed_duration_since(Utc::now());
    match remaining.to_std() {
        Ok(window) if !window.is_zero() => window,
        _ => Duration::from_secs(1),
    }
}

/// Renders the store's description template, substituting `{StoreName}`,
/// `{ItemDescription}` and `{OrderId}` case-insensitively. Missing values
/// substitute as the empty string.
fn render_description(template: &str, store: &StoreConfig, invoice: &Invoice) -> String {
    let mut description =
        replace_ignore_case(template, "{StoreName}", store.store_name.as_deref().unwrap_or(""));
    description = replace_ignore_case(
        &description,
        "{ItemDescription}",
        invoice.item_description.as_deref().unwrap_or(""),
    );
    replace_ignore_case(&description, "{OrderId}", &invoice.order_id)
}

/// Replaces every ASCII-case-insensitive occurrence of `pattern` in
/// `haystack` with `value`. `pattern` must be ASCII.
fn replace_ignore_case(haystack: &str, pattern: &str, value: &str) -> String {
    debug_assert!(pattern.is_ascii());
    let bytes = haystack.as_bytes();
    let pattern_bytes = pattern.as_bytes();
    let mut out = String::with_capacity(haystack.len());
    let mut i = 0;
    while i < bytes.len() {
        let matches = haystack.is_char_boundary(i)
            && i + pattern_bytes.len() <= bytes.len()
            && bytes[i..i + pattern_bytes.len()].eq_ignore_ascii_case(pattern_bytes);
        if matches {
            out.push_str(value);
            i += pattern_bytes.len();
        } else {
            let next = (i + 1..=bytes.len())
                .find(|&j| haystack.is_char_boundary(j))
                .unwrap_or(bytes.len());
            out.push_str(&haystack[i..next]);
            i = next;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn invoice_with(price: Decimal, rate: Decimal) -> Invoice {
        Invoice {
            order_id: "order-42".to_string(),
            price,
            rate,
            expiration_time: Utc::now() + chrono::Duration::minutes(15),
            item_description: Some("coffee".to_string()),
        }
    }

    #[test]
    fn test_due_amount_rounds_up_to_eight_digits() {
        let due = due_amount(&invoice_with(dec!(10), dec!(3))).unwrap();
        assert_eq!(due, dec!(3.33333334));
    }

    #[test]
    fn test_due_amount_exact_divisions_are_untouched() {
        let due = due_amount(&invoice_with(dec!(10), dec!(4))).unwrap();
        assert_eq!(due, dec!(2.5));
    }

    #[test]
    fn test_due_amount_never_below_unrounded_value() {
        let invoice = invoice_with(dec!(1), dec!(7));
        let due = due_amount(&invoice).unwrap();
        let unrounded = invoice.price / invoice.rate;
        assert!(due >= unrounded);
    }

    #[test]
    fn test_due_amount_zero_rate_fails() {
        let err = due_amount(&invoice_with(dec!(10), dec!(0))).unwrap_err();
        assert!(err.message().contains("no exchange rate"));
    }

    #[test]
    fn test_expired_invoice_clamps_to_one_second() {
        let mut invoice = invoice_with(dec!(10), dec!(3));
        invoice.expiration_time = Utc::now() - chrono::Duration::minutes(5);
        assert_eq!(remaining_validity(&invoice), Duration::from_secs(1));
    }

    #[test]
    fn test_future_expiration_keeps_its_window() {
        let mut invoice = invoice_with(dec!(10), dec!(3));
        invoice.expiration_time = Utc::now() + chrono::Duration::minutes(10);
        let window = remaining_validity(&invoice);
        assert!(window > Duration::from_secs(590));
        assert!(window <= Duration::from_secs(600));
    }

    #[test]
    fn test_description_substitution_is_case_insensitive() {
        let store = StoreConfig {
            store_name: Some("Acme".to_string()),
            description_template: "Paid to {STORENAME} for {itemdescription} ({OrderId})"
                .to_string(),
        };
        let invoice = invoice_with(dec!(10), dec!(3));
        assert_eq!(
            render_description(&store.description_template, &store, &invoice),
            "Paid to Acme for coffee (order-42)"
        );
    }

    #[test]
    fn test_missing_values_substitute_empty_string() {
        let store = StoreConfig {
            store_name: None,
            description_template: "{StoreName}:{ItemDescription}:{OrderId}".to_string(),
        };
        let mut invoice = invoice_with(dec!(10), dec!(3));
        invoice.item_description = None;
        assert_eq!(
            render_description(&store.description_template, &store, &invoice),
            "::order-42"
        );
    }

    #[test]
    fn test_substitution_is_order_independent() {
        let store = StoreConfig {
            store_name: Some("Acme".to_string()),
            description_template: "{OrderId} {StoreName} {OrderId}".to_string(),
        };
        let invoice = invoice_with(dec!(10), dec!(3));
        assert_eq!(
            render_description(&store.description_template, &store, &invoice),
            "order-42 Acme order-42"
        );
    }

    #[test]
    fn test_replace_ignore_case_handles_multibyte_text() {
        assert_eq!(
            replace_ignore_case("café {X} café", "{x}", "thé"),
            "café thé café"
        );
    }

    #[test]
    fn test_unrecognized_placeholders_are_left_in_place() {
        let store = StoreConfig {
            store_name: Some("Acme".to_string()),
            description_template: "{StoreName} {Unknown}".to_string(),
        };
        let invoice = invoice_with(dec!(10), dec!(3));
        assert_eq!(
            render_description(&store.description_template, &store, &invoice),
            "Acme {Unknown}"
        );
    }
}
