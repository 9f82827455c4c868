//! Extraction of contact details and the communication address from a
//! node's DID document.

use nodescope_node_client::DidDocument;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Service type carrying the node operator's contact details.
pub const CONTACT_INFO_SERVICE: &str = "node-contact-info";

/// Service type carrying the node's gRPC endpoint.
pub const COMM_SERVICE: &str = "NutsComm";

/// Contact details published by a node operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContactInfo {
    pub name: Option<String>,
    pub phone: Option<String>,
    #[serde(alias = "web")]
    pub website: Option<String>,
    pub email: Option<String>,
}

/// Why no communication address could be derived from a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    #[error("document has no {0} service")]
    MissingService(&'static str),

    #[error("{0} endpoint is not a string")]
    NotAString(&'static str),

    #[error("{0} endpoint is an unresolved reference: {1}")]
    Reference(&'static str, String),

    #[error("endpoint {0} has no host:port")]
    NoHostPort(String),
}

/// Contact details from the first `node-contact-info` service.
///
/// A missing service or an endpoint that is not an object yields `None`.
pub fn contact_info(document: &DidDocument) -> Option<ContactInfo> {
    let service = document.service_of_type(CONTACT_INFO_SERVICE)?;
    match ContactInfo::deserialize(&service.endpoint) {
        Ok(info) => Some(info),
        Err(error) => {
            debug!(did = %document.id, %error, "Ignoring malformed contact info");
            None
        }
    }
}

/// The `host:port` of the first `NutsComm` service, with the URL scheme
/// (`grpc://`) stripped.
pub fn comm_address(document: &DidDocument) -> Result<String, EndpointError> {
    let service = document
        .service_of_type(COMM_SERVICE)
        .ok_or(EndpointError::MissingService(COMM_SERVICE))?;

    let Value::String(endpoint) = &service.endpoint else {
        return Err(EndpointError::NotAString(COMM_SERVICE));
    };
    if endpoint.starts_with("did:") {
        return Err(EndpointError::Reference(COMM_SERVICE, endpoint.clone()));
    }

    host_port(endpoint).ok_or_else(|| EndpointError::NoHostPort(endpoint.clone()))
}

fn host_port(endpoint: &str) -> Option<String> {
    let rest = endpoint
        .split_once("://")
        .map_or(endpoint, |(_, rest)| rest);
    let authority = rest.split('/').next().unwrap_or_default();
    let (host, port) = authority.rsplit_once(':')?;
    if host.is_empty() || port.parse::<u16>().is_err() {
        return None;
    }
    Some(authority.to_string())
}
