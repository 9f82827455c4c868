//! Client for the HTTP APIs of the monitored node.
//!
//! This crate provides:
//! - [`NodeClient`] - The calls the monitor makes into a node
//! - [`HttpNodeClient`] - reqwest implementation of [`NodeClient`]
//! - Wire types for diagnostics, peer diagnostics, health and DID documents
//!
//! Calls to `/internal` endpoints go to [`NodeArgs::internal_address`], which
//! falls back to the public address when unset.

mod args;
mod error;
mod http;
mod types;

pub use args::{DEFAULT_NODE_ADDRESS, DEFAULT_REQUEST_TIMEOUT_SECS, NodeArgs};
pub use error::ClientError;
pub use http::HttpNodeClient;
pub use types::*;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

/// Calls into a node's diagnostics, network and VDR APIs.
///
/// Implementations must tolerate concurrent use: topology enrichment issues
/// one [`NodeClient::document`] call per peer at the same time.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Diagnostics of the node itself, including its live connections.
    async fn self_diagnostics(&self) -> Result<SelfDiagnostics, ClientError>;

    /// Diagnostics reported by each peer, keyed by raw peer ID.
    async fn peer_diagnostics(&self) -> Result<HashMap<String, PeerDiagnostics>, ClientError>;

    /// Resolve a DID to its current document.
    async fn document(&self, did: &str) -> Result<DidDocument, ClientError>;

    /// Health of the node. A node reporting `DOWN` is not an error.
    async fn check_health(&self) -> Result<Health, ClientError>;
}

#[async_trait]
impl<T: NodeClient + ?Sized> NodeClient for Arc<T> {
    async fn self_diagnostics(&self) -> Result<SelfDiagnostics, ClientError> {
        (**self).self_diagnostics().await
    }

    async fn peer_diagnostics(&self) -> Result<HashMap<String, PeerDiagnostics>, ClientError> {
        (**self).peer_diagnostics().await
    }

    async fn document(&self, did: &str) -> Result<DidDocument, ClientError> {
        (**self).document(did).await
    }

    async fn check_health(&self) -> Result<Health, ClientError> {
        (**self).check_health().await
    }
}
