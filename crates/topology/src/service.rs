//! Entry point that builds a [`NetworkTopology`] per request.

use std::time::{Duration, Instant};

use nodescope_node_client::NodeClient;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::metrics::TopologyMetrics;
use crate::{CertificateReader, EnrichmentArgs, NetworkTopology, TopologyError};

/// Combines the node's diagnostics into a single network graph.
///
/// Building happens in three passes, each owning the peer list exclusively:
/// seed and merge ([`TopologyService::assemble`]), then enrich
/// ([`TopologyService::enrich`]).
#[derive(Debug)]
pub struct TopologyService<C, R> {
    pub(crate) client: C,
    pub(crate) certificates: R,
    /// Bound on every document fetch and certificate read.
    pub(crate) unit_timeout: Duration,
    pub(crate) metrics: TopologyMetrics,
}

impl<C, R> TopologyService<C, R>
where
    C: NodeClient,
    R: CertificateReader,
{
    pub fn new(client: C, certificates: R, args: &EnrichmentArgs) -> Self {
        Self {
            client,
            certificates,
            unit_timeout: args.timeout(),
            metrics: TopologyMetrics::default(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Build the topology of the network around the node.
    ///
    /// Fails only when the diagnostics cannot be retrieved, or when `cancel`
    /// fires before they are. Cancellation during enrichment stops all
    /// outstanding lookups and returns the partially enriched graph, which
    /// is counted apart from completed builds.
    pub async fn network_topology(
        &self,
        cancel: &CancellationToken,
    ) -> Result<NetworkTopology, TopologyError> {
        let started = Instant::now();

        let mut topology = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TopologyError::Cancelled),
            assembled = self.assemble() => assembled?,
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                self.metrics.cancelled_builds_total.increment(1);
                info!("Topology enrichment cancelled, returning partial data");
                return Ok(topology);
            }
            _ = self.enrich(&mut topology.peers) => {}
        }

        let elapsed = started.elapsed();
        self.metrics.builds_total.increment(1);
        self.metrics
            .build_duration_seconds
            .record(elapsed.as_secs_f64());
        debug!(
            peers = topology.peers.len(),
            edges = topology.edges.len(),
            ?elapsed,
            "Built network topology"
        );

        Ok(topology)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    use metrics::Counter;

    use super::*;
    use crate::test_utils::{
        Gate, MockCertificates, MockNode, connected, node_document, self_diagnostics,
    };

    struct Counted {
        builds: Arc<AtomicU64>,
        cancelled: Arc<AtomicU64>,
    }

    fn counted<C: NodeClient, R: CertificateReader>(
        service: &mut TopologyService<C, R>,
    ) -> Counted {
        let counted = Counted {
            builds: Arc::new(AtomicU64::new(0)),
            cancelled: Arc::new(AtomicU64::new(0)),
        };
        service.metrics.builds_total = Counter::from_arc(counted.builds.clone());
        service.metrics.cancelled_builds_total = Counter::from_arc(counted.cancelled.clone());
        counted
    }

    fn node() -> MockNode {
        MockNode::new(self_diagnostics(
            "us",
            0,
            vec![connected("b", Some("did:nuts:b"), true)],
        ))
        .with_document(node_document("did:nuts:b", Some("grpc://b:5555"), None))
    }

    #[tokio::test]
    async fn test_completed_build_is_counted() {
        let certificates = MockCertificates::default().with_subject("b:5555", "CN=b");
        let mut service = TopologyService::new(node(), certificates, &EnrichmentArgs::default());
        let counted = counted(&mut service);

        service
            .network_topology(&CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(counted.builds.load(Ordering::SeqCst), 1);
        assert_eq!(counted.cancelled.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancelled_build_is_not_counted_as_completed() {
        let dials = Gate::new();
        let certificates = MockCertificates::default().with_default_gate(dials.clone());
        let mut service = TopologyService::new(node(), certificates, &EnrichmentArgs::default());
        let counted = counted(&mut service);

        let cancel = CancellationToken::new();
        let (topology, ()) = tokio::join!(service.network_topology(&cancel), async {
            dials.wait_entered(1).await;
            cancel.cancel();
        });

        assert!(topology.is_ok());
        assert_eq!(counted.builds.load(Ordering::SeqCst), 0);
        assert_eq!(counted.cancelled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_before_assembly_is_not_counted() {
        let mut service = TopologyService::new(
            node(),
            MockCertificates::default(),
            &EnrichmentArgs::default(),
        );
        let counted = counted(&mut service);
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(service.network_topology(&cancel).await.is_err());
        assert_eq!(counted.builds.load(Ordering::SeqCst), 0);
        assert_eq!(counted.cancelled.load(Ordering::SeqCst), 0);
    }
}
