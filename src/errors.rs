//! Error types for the multirail library.
//!
//! Every failure this crate surfaces collapses into a single kind,
//! [`RailUnavailable`]: the selected settlement rail cannot be offered right
//! now. External-call failures are caught at the point of call and re-wrapped
//! so that no raw transport or client error crosses the handler boundary.

use thiserror::Error;

/// Boxed error type used by the external service traits.
///
/// Collaborator implementations (explorer clients, wallets, channel RPC
/// clients) report failures through this type; handlers re-wrap them into
/// [`RailUnavailable`] before returning.
pub type ServiceError = Box<dyn std::error::Error + Send + Sync>;

/// The selected settlement rail is not usable right now.
///
/// Carries a human-readable cause and, where one exists, the underlying
/// error. Callers should treat this as "this rail cannot be offered for this
/// invoice" and either hide the rail or prompt the payer to pick another.
/// There is no automatic retry inside this crate; retrying an entire
/// invocation is safe (each attempt reserves a fresh address or generates a
/// fresh request).
#[derive(Error, Debug)]
#[error("{message}")]
pub struct RailUnavailable {
    message: String,
    #[source]
    source: Option<ServiceError>,
}

impl RailUnavailable {
    /// Creates an error from a cause message alone.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error wrapping an underlying failure.
    ///
    /// The message should already include the underlying cause text; the
    /// source is kept for error-chain inspection.
    pub fn with_source(message: impl Into<String>, source: ServiceError) -> Self {
        Self {
            message: message.into(),
            source: Some(source),
        }
    }

    /// The human-readable cause.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result type alias for rail resolution operations.
pub type Result<T> = std::result::Result<T, RailUnavailable>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_is_the_message() {
        let err = RailUnavailable::new("full node not available");
        assert_eq!(err.to_string(), "full node not available");
    }

    #[test]
    fn test_source_is_preserved() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = RailUnavailable::with_source(
            format!("error while connecting to the node API ({})", io),
            Box::new(io),
        );
        assert!(err.to_string().contains("refused"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_no_source_by_default() {
        let err = RailUnavailable::new("no public address configured");
        assert!(err.source().is_none());
    }
}
