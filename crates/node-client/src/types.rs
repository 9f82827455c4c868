//! Wire types returned by the node's diagnostics, network and VDR APIs.
//!
//! Only the fields the monitor consumes are typed. Unknown fields are ignored
//! so newer node versions keep deserializing.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Decode an explicit `null` like a missing field.
///
/// The node encodes empty lists as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Response of `GET /status/diagnostics`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfDiagnostics {
    /// Network engine diagnostics.
    pub network: NetworkDiagnostics,
    /// General node status (software version, uptime). Passed through untyped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
    /// Sections of other node engines, kept for passthrough.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SelfDiagnostics {
    /// The node's own peer ID as reported by its network engine.
    pub fn own_peer_id(&self) -> &str {
        &self.network.connections.peer_id
    }

    /// Number of transactions on the node's own DAG.
    pub fn own_transaction_count(&self) -> u64 {
        self.network.state.transaction_count
    }

    /// Peers the node currently holds a connection with.
    pub fn connected_peers(&self) -> &[ConnectedPeer] {
        &self.network.connections.connected_peers
    }
}

/// The `network` section of the self-diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkDiagnostics {
    pub connections: ConnectionsDiagnostics,
    pub state: StateDiagnostics,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Connection information of the node itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionsDiagnostics {
    /// Own peer ID.
    pub peer_id: String,
    /// Peers with a live connection.
    #[serde(deserialize_with = "null_as_default")]
    pub connected_peers: Vec<ConnectedPeer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_peers_count: Option<u64>,
}

/// One entry of the node's own connection list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectedPeer {
    /// Peer ID, already without transport suffixes.
    pub id: String,
    /// Transport address of the connection.
    pub address: String,
    /// DID of the peer's node, only present when the node knows it.
    #[serde(rename = "nodedid", skip_serializing_if = "Option::is_none")]
    pub node_did: Option<String>,
    /// Whether the peer's identity is confirmed on this connection.
    pub authenticated: bool,
}

/// DAG state of the node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateDiagnostics {
    pub transaction_count: u64,
    /// Remaining DAG statistics (lamport clock, heads, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A peer's self-reported view of itself, as relayed by our node.
///
/// Returned per raw peer ID by `GET /internal/network/v1/diagnostics/peers`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PeerDiagnostics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// PEM encoded TLS certificate of the peer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
    #[serde(rename = "nodeDID", skip_serializing_if = "Option::is_none")]
    pub node_did: Option<String>,
    /// Raw IDs of the peers this peer is connected to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peers: Option<Vec<String>>,
    #[serde(rename = "softwareID", skip_serializing_if = "Option::is_none")]
    pub software_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software_version: Option<String>,
    /// Number of transactions on the peer's DAG. Sent as a JSON number that
    /// may carry a fractional part.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_num: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<f64>,
}

impl PeerDiagnostics {
    /// Transaction count as a non-negative integer.
    pub fn transaction_count(&self) -> Option<u64> {
        self.transaction_num
            .filter(|n| n.is_finite())
            .map(|n| n.max(0.0) as u64)
    }
}

/// Response of `GET /health`, both for `200` and `503`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Health {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, HealthCheckResult>>,
}

/// Result of one named health check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheckResult {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Response of `GET /internal/vdr/v1/did/{did}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DidResolutionResult {
    pub document: DidDocument,
    #[serde(rename = "documentMetadata")]
    pub metadata: Value,
}

/// A DID document, reduced to its identifier and services.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DidDocument {
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub service: Vec<Service>,
}

impl DidDocument {
    /// First service of the given type.
    pub fn service_of_type(&self, kind: &str) -> Option<&Service> {
        self.service.iter().find(|s| s.kind == kind)
    }
}

/// A named service endpoint of a DID document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Service {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Either a URL string, a DID reference or a structured object.
    #[serde(rename = "serviceEndpoint")]
    pub endpoint: Value,
}
