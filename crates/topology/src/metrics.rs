//! Topology build metrics

use core::fmt;
use metrics::{Counter, Histogram};

/// Topology build metrics
#[derive(Clone)]
pub(crate) struct TopologyMetrics {
    /// Number of completed topology builds
    pub(crate) builds_total: Counter,
    /// Number of builds cancelled during enrichment
    pub(crate) cancelled_builds_total: Counter,
    /// Time spent assembling and enriching one completed topology
    pub(crate) build_duration_seconds: Histogram,
    /// Number of peers an enrichment unit was started for
    pub(crate) enriched_peers_total: Counter,
    /// Number of failed or timed out DID document fetches
    pub(crate) document_failures_total: Counter,
    /// Number of failed or timed out certificate reads
    pub(crate) certificate_failures_total: Counter,
}

impl fmt::Debug for TopologyMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopologyMetrics").finish_non_exhaustive()
    }
}

impl Default for TopologyMetrics {
    fn default() -> Self {
        Self {
            builds_total: metrics::counter!("topology.builds_total"),
            cancelled_builds_total: metrics::counter!("topology.cancelled_builds_total"),
            build_duration_seconds: metrics::histogram!("topology.build.duration_seconds"),
            enriched_peers_total: metrics::counter!("topology.enrichment.peers_total"),
            document_failures_total: metrics::counter!(
                "topology.enrichment.document_failures_total"
            ),
            certificate_failures_total: metrics::counter!(
                "topology.enrichment.certificate_failures_total"
            ),
        }
    }
}
