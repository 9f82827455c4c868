use nodescope_node_client::ClientError;
use thiserror::Error;

/// Errors that abort building a topology.
///
/// Per-peer enrichment failures never surface here; they only degrade the
/// affected peer's record.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// Self-diagnostics or peer diagnostics could not be retrieved.
    #[error("failed to retrieve diagnostics: {0}")]
    Diagnostics(#[from] ClientError),

    /// The build was cancelled before the graph was assembled.
    #[error("topology build cancelled")]
    Cancelled,
}
