//! Network topology around a monitored node.
//!
//! This crate provides:
//! - [`NetworkTopology`] - Peers and undirected edges as reported by the node
//! - [`TopologyService`] - Builds a topology from diagnostics and enriches it
//! - [`TlsCertificateReader`] - Reads the certificate subject a peer presents
//!
//! A build merges the node's own diagnostics with the diagnostics its peers
//! report, then looks up every authenticated peer's DID document and TLS
//! certificate concurrently. Only a failure to retrieve diagnostics fails
//! the build; lookup failures leave fields of the affected peer empty.

mod args;
mod assembler;
mod certificate;
mod document;
mod enrich;
mod error;
mod graph;
mod metrics;
mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use args::{DEFAULT_ENRICHMENT_TIMEOUT_SECS, EnrichmentArgs};
pub use certificate::{
    CertificateError, CertificateReader, CertificateTrust, TlsCertificateReader, subject_from_der,
    subject_from_pem,
};
pub use document::{
    COMM_SERVICE, CONTACT_INFO_SERVICE, ContactInfo, EndpointError, comm_address, contact_info,
};
pub use error::TopologyError;
pub use graph::{
    BOOTSTRAP_SUFFIX, Edge, NetworkTopology, Peer, PeerLookup, edge_exists, find_or_create,
    normalize_peer_id,
};
pub use service::TopologyService;
