//! Liveness verification for payment-channel nodes.
//!
//! Two independent checks live here:
//!
//! - [`NodeVerifier`] queries the remote node for identity and sync status
//!   under a bounded deadline and validates a fixed sequence of liveness
//!   conditions against the full-node dashboard.
//! - [`probe_connectivity`] proves raw transport-level reachability of a
//!   verified node endpoint: literal-IP parse first, DNS fallback otherwise,
//!   then a cancellation-aware TCP connect.
//!
//! Neither check caches anything; node health can change between invoices, so
//! each payment-request creation attempt re-runs them.

use crate::errors::{RailUnavailable, Result};
use crate::services::{ChannelClientFactory, SyncDashboard};
use crate::timeout::{race_cancel, deadline, RaceOutcome};
use crate::types::{ChannelNodeConfig, Network, NodeIdentity};
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{lookup_host, TcpStream};
use tracing::{debug, warn};

/// How long the node gets to answer the identity/info query.
const NODE_INFO_DEADLINE: Duration = Duration::from_secs(5);

/// Largest tolerated gap between the node's reported height and the full
/// node's chain height. A gap of exactly this many blocks still passes.
const MAX_BLOCK_GAP: u32 = 10;

/// Validates that a payment-channel node is usable right now.
#[derive(Clone)]
pub struct NodeVerifier {
    dashboard: Arc<dyn SyncDashboard>,
    clients: Arc<dyn ChannelClientFactory>,
}

impl NodeVerifier {
    /// Creates a verifier over the given dashboard and client factory.
    pub fn new(dashboard: Arc<dyn SyncDashboard>, clients: Arc<dyn ChannelClientFactory>) -> Self {
        Self { dashboard, clients }
    }

    /// Runs the liveness checks in order; the first failing condition wins.
    ///
    /// 1. The full node backing `network` must be fully synchronized.
    /// 2. The node must answer the info query within 5 seconds; a timeout is
    ///    reported distinctly from a transport/API error, but both map to
    ///    [`RailUnavailable`].
    /// 3. The node must report a public network address.
    /// 4. The node's height must be within 10 blocks of the chain height.
    ///
    /// On success, returns the [`NodeIdentity`] built from the node's
    /// reported identity, address, and port.
    pub async fn verify(
        &self,
        config: &ChannelNodeConfig,
        network: &Network,
    ) -> Result<NodeIdentity> {
        let summary = self
            .dashboard
            .is_fully_synced(&network.code)
            .await
            .ok_or_else(|| RailUnavailable::new("full node not available"))?;

        let client = self.clients.create_client(config, network);
        let info = match race_cancel(client.get_info(), deadline(NODE_INFO_DEADLINE)).await {
            RaceOutcome::TimedOut => {
                warn!(network = %network.code, "node info query timed out");
                return Err(RailUnavailable::new(
                    "the node did not reply in a timely manner",
                ));
            }
            RaceOutcome::Completed(Err(e)) => {
                warn!(network = %network.code, error = %e, "node info query failed");
                return Err(RailUnavailable::with_source(
                    format!("error while connecting to the node API ({})", e),
                    e,
                ));
            }
            RaceOutcome::Completed(Ok(info)) => info,
        };

        let host = info
            .address
            .ok_or_else(|| RailUnavailable::new("no public address configured"))?;

        let blocks_gap = info.block_height.abs_diff(summary.chain_height);
        if blocks_gap > MAX_BLOCK_GAP {
            return Err(RailUnavailable::new(format!(
                "the node is not synchronized ({} blocks)",
                blocks_gap
            )));
        }

        debug!(
            node_id = %info.node_id,
            host = %host,
            blocks_gap,
            "node liveness checks passed"
        );

        Ok(NodeIdentity {
            public_key: info.node_id,
            host,
            port: info.p2p_port,
        })
    }
}

/// Proves transport-level reachability of a node endpoint.
///
/// The host is treated as a literal IP address first; only if that parse
/// fails is it DNS-resolved, taking the first returned address. The TCP
/// connect attempt races the caller-supplied cancellation signal, so a
/// caller-imposed deadline aborts the attempt without leaving the socket
/// attempt dangling. The opened connection only proves reachability and is
/// dropped before returning.
pub async fn probe_connectivity(
    identity: &NodeIdentity,
    cancellation: impl Future<Output = ()> + Send,
) -> Result<()> {
    match try_connect(identity, cancellation).await {
        Ok(()) => {
            debug!(host = %identity.host, port = identity.port, "node endpoint reachable");
            Ok(())
        }
        Err(cause) => Err(RailUnavailable::new(format!(
            "error while connecting to the node via {}:{} ({})",
            identity.host, identity.port, cause
        ))),
    }
}

async fn try_connect(
    identity: &NodeIdentity,
    cancellation: impl Future<Output = ()> + Send,
) -> std::result::Result<(), String> {
    let ip = match identity.host.parse::<IpAddr>() {
        Ok(ip) => ip,
        Err(_) => {
            let mut addrs = lookup_host((identity.host.as_str(), identity.port))
                .await
                .map_err(|e| e.to_string())?;
            match addrs.next() {
                Some(resolved) => resolved.ip(),
                None => return Err(format!("DNS did not resolve {}", identity.host)),
            }
        }
    };

    let addr = SocketAddr::new(ip, identity.port);
    match race_cancel(TcpStream::connect(addr), cancellation).await {
        RaceOutcome::TimedOut => Err("connection attempt cancelled".to_string()),
        RaceOutcome::Completed(Err(e)) => Err(e.to_string()),
        RaceOutcome::Completed(Ok(stream)) => {
            drop(stream);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ServiceError;
    use crate::services::ChannelClient;
    use crate::types::{ChainSummary, ChannelNodeInfo, ChannelRequest};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::future::pending;

    struct FixedDashboard(Option<ChainSummary>);

    #[async_trait]
    impl SyncDashboard for FixedDashboard {
        async fn is_fully_synced(&self, _network_code: &str) -> Option<ChainSummary> {
            self.0
        }
    }

    enum InfoBehavior {
        Reply(ChannelNodeInfo),
        Fail(String),
        Hang,
    }

    struct FixedClient(InfoBehavior);

    #[async_trait]
    impl ChannelClient for FixedClient {
        async fn get_info(&self) -> std::result::Result<ChannelNodeInfo, ServiceError> {
            match &self.0 {
                InfoBehavior::Reply(info) => Ok(info.clone()),
                InfoBehavior::Fail(message) => Err(message.clone().into()),
                InfoBehavior::Hang => pending().await,
            }
        }

        async fn create_request(
            &self,
            _amount: Decimal,
            _description: &str,
            _expiry: Duration,
        ) -> std::result::Result<ChannelRequest, ServiceError> {
            unreachable!("not exercised by verifier tests")
        }
    }

    struct FixedFactory(Arc<FixedClient>);

    impl ChannelClientFactory for FixedFactory {
        fn create_client(
            &self,
            _config: &ChannelNodeConfig,
            _network: &Network,
        ) -> Arc<dyn ChannelClient> {
            self.0.clone()
        }
    }

    fn verifier(summary: Option<ChainSummary>, behavior: InfoBehavior) -> NodeVerifier {
        NodeVerifier::new(
            Arc::new(FixedDashboard(summary)),
            Arc::new(FixedFactory(Arc::new(FixedClient(behavior)))),
        )
    }

    fn node_config() -> ChannelNodeConfig {
        ChannelNodeConfig {
            connection_string: "type=test".to_string(),
        }
    }

    fn network() -> Network {
        Network::new("BTC", "Bitcoin")
    }

    fn healthy_info(block_height: u32) -> ChannelNodeInfo {
        ChannelNodeInfo {
            node_id: "02abc".to_string(),
            address: Some("1.2.3.4".to_string()),
            p2p_port: 9735,
            block_height,
        }
    }

    #[tokio::test]
    async fn test_unsynced_full_node_fails_first() {
        let v = verifier(None, InfoBehavior::Hang);
        let err = v.verify(&node_config(), &network()).await.unwrap_err();
        assert_eq!(err.message(), "full node not available");
    }

    #[tokio::test(start_paused = true)]
    async fn test_info_query_timeout() {
        let v = verifier(Some(ChainSummary { chain_height: 100 }), InfoBehavior::Hang);
        let err = v.verify(&node_config(), &network()).await.unwrap_err();
        assert!(err.message().contains("did not reply in a timely manner"));
    }

    #[tokio::test]
    async fn test_info_query_transport_error() {
        let v = verifier(
            Some(ChainSummary { chain_height: 100 }),
            InfoBehavior::Fail("connection reset".to_string()),
        );
        let err = v.verify(&node_config(), &network()).await.unwrap_err();
        assert!(err.message().contains("error while connecting to the node API"));
        assert!(err.message().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_missing_public_address() {
        let mut info = healthy_info(100);
        info.address = None;
        let v = verifier(
            Some(ChainSummary { chain_height: 100 }),
            InfoBehavior::Reply(info),
        );
        let err = v.verify(&node_config(), &network()).await.unwrap_err();
        assert_eq!(err.message(), "no public address configured");
    }

    #[tokio::test]
    async fn test_block_gap_boundary_is_inclusive_at_ten() {
        // Gap of exactly 10 blocks passes.
        let v = verifier(
            Some(ChainSummary { chain_height: 100 }),
            InfoBehavior::Reply(healthy_info(90)),
        );
        let identity = v.verify(&node_config(), &network()).await.unwrap();
        assert_eq!(identity.to_string(), "02abc@1.2.3.4:9735");

        // Gap of 11 fails, reporting the gap.
        let v = verifier(
            Some(ChainSummary { chain_height: 100 }),
            InfoBehavior::Reply(healthy_info(111)),
        );
        let err = v.verify(&node_config(), &network()).await.unwrap_err();
        assert!(err.message().contains("not synchronized (11 blocks)"));
    }

    #[tokio::test]
    async fn test_verify_builds_identity_from_reported_info() {
        let v = verifier(
            Some(ChainSummary { chain_height: 100 }),
            InfoBehavior::Reply(healthy_info(95)),
        );
        let identity = v.verify(&node_config(), &network()).await.unwrap();
        assert_eq!(identity.public_key, "02abc");
        assert_eq!(identity.host, "1.2.3.4");
        assert_eq!(identity.port, 9735);
    }

    #[tokio::test]
    async fn test_probe_unreachable_port_reports_host_and_port() {
        let identity = NodeIdentity {
            public_key: "02abc".to_string(),
            host: "127.0.0.1".to_string(),
            port: 1,
        };
        let err = probe_connectivity(&identity, pending()).await.unwrap_err();
        assert!(err.message().contains("127.0.0.1"));
        assert!(err.message().contains(":1"));
    }

    #[tokio::test]
    async fn test_probe_dns_failure() {
        // The .invalid TLD is reserved and never resolves.
        let identity = NodeIdentity {
            public_key: "02abc".to_string(),
            host: "nonexistent.invalid".to_string(),
            port: 9735,
        };
        let err = probe_connectivity(&identity, pending()).await.unwrap_err();
        assert!(err.message().contains("nonexistent.invalid"));
    }

    #[tokio::test]
    async fn test_probe_cancellation_aborts_attempt() {
        let identity = NodeIdentity {
            public_key: "02abc".to_string(),
            host: "127.0.0.1".to_string(),
            port: 1,
        };
        let err = probe_connectivity(&identity, std::future::ready(()))
            .await
            .unwrap_err();
        assert!(err.message().contains("cancelled"));
    }

    #[tokio::test]
    async fn test_probe_succeeds_against_listening_socket() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let identity = NodeIdentity {
            public_key: "02abc".to_string(),
            host: "127.0.0.1".to_string(),
            port,
        };
        probe_connectivity(&identity, pending()).await.unwrap();
    }
}
