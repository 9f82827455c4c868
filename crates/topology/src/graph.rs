//! Graph model: peers, undirected edges and the topology aggregate.

use std::hash::{Hash, Hasher};

use serde::{Serialize, Serializer, ser::SerializeTuple};

/// Suffix the transport appends to the IDs of bootstrap-only connections.
pub const BOOTSTRAP_SUFFIX: &str = "-bootstrap";

/// Strip the bootstrap marker from a raw peer ID.
///
/// Everything from the first occurrence of the marker on is dropped, so the
/// result never contains it and normalizing again is a no-op.
pub fn normalize_peer_id(raw: &str) -> &str {
    raw.split_once(BOOTSTRAP_SUFFIX).map_or(raw, |(id, _)| id)
}

/// One network participant known to the node.
///
/// Unknown attributes are `None`; on the wire they are rendered as empty
/// strings, except `node_did` which is omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Peer {
    /// Normalized peer ID, unique within a topology.
    pub peer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_did: Option<String>,
    #[serde(serialize_with = "empty_if_none")]
    pub address: Option<String>,
    /// Identity confirmed on a live connection of our node. Gates enrichment.
    pub authenticated: bool,
    /// Subject DN of the peer's TLS certificate.
    #[serde(rename = "cn", serialize_with = "empty_if_none")]
    pub certificate_subject: Option<String>,
    #[serde(rename = "tx_count")]
    pub transaction_count: u64,
    #[serde(serialize_with = "empty_if_none")]
    pub contact_name: Option<String>,
    #[serde(serialize_with = "empty_if_none")]
    pub contact_phone: Option<String>,
    #[serde(serialize_with = "empty_if_none")]
    pub contact_web: Option<String>,
    #[serde(serialize_with = "empty_if_none")]
    pub contact_email: Option<String>,
    #[serde(serialize_with = "empty_if_none")]
    pub software_version: Option<String>,
    #[serde(serialize_with = "empty_if_none")]
    pub software_id: Option<String>,
}

impl Peer {
    /// A peer that only carries its ID.
    pub fn new(peer_id: impl Into<String>) -> Self {
        Self {
            peer_id: peer_id.into(),
            ..Default::default()
        }
    }

    /// Whether the enrichment pass should look this peer up.
    pub fn is_enrichable(&self) -> bool {
        self.authenticated && self.node_did.is_some()
    }
}

fn empty_if_none<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_deref().unwrap_or_default())
}

/// An observed connection between two peers.
///
/// Undirected: `Edge::new(a, b) == Edge::new(b, a)`, and both hash the same.
#[derive(Debug, Clone)]
pub struct Edge(String, String);

impl Edge {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self(a.into(), b.into())
    }

    /// The endpoints in the order they were observed.
    pub fn endpoints(&self) -> (&str, &str) {
        (&self.0, &self.1)
    }

    /// Whether `peer_id` is one of the endpoints.
    pub fn touches(&self, peer_id: &str) -> bool {
        self.0 == peer_id || self.1 == peer_id
    }

    fn ordered(&self) -> (&str, &str) {
        if self.0 <= self.1 {
            (&self.0, &self.1)
        } else {
            (&self.1, &self.0)
        }
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        (self.0 == other.0 && self.1 == other.1) || (self.0 == other.1 && self.1 == other.0)
    }
}

impl Eq for Edge {}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ordered().hash(state);
    }
}

impl Serialize for Edge {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.0)?;
        tuple.serialize_element(&self.1)?;
        tuple.end()
    }
}

/// Peers and connections as seen from one node.
///
/// Built fresh for every request. `peers[0]` is always the node itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NetworkTopology {
    pub edges: Vec<Edge>,
    #[serde(rename = "peerID")]
    pub own_peer_id: String,
    pub peers: Vec<Peer>,
    #[serde(rename = "tx_count")]
    pub total_transaction_count: u64,
}

impl NetworkTopology {
    /// A topology holding only the node's own vertex.
    pub fn seed(own_peer_id: impl Into<String>, transaction_count: u64) -> Self {
        let own_peer_id = own_peer_id.into();
        let own = Peer {
            transaction_count,
            ..Peer::new(own_peer_id.clone())
        };
        Self {
            edges: Vec::new(),
            own_peer_id,
            peers: vec![own],
            total_transaction_count: transaction_count,
        }
    }

    /// Look up a peer by normalized ID.
    pub fn peer(&self, peer_id: &str) -> Option<&Peer> {
        self.peers.iter().find(|p| p.peer_id == peer_id)
    }

    /// Add an edge unless a symmetric-equal one is already present.
    ///
    /// Returns whether the edge was added.
    pub fn insert_edge(&mut self, edge: Edge) -> bool {
        if edge_exists(&self.edges, &edge) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    /// Make sure a vertex exists for `peer_id`, appending a bare one if not.
    pub fn ensure_peer(&mut self, peer_id: &str) {
        if let PeerLookup::Missing(peer) = find_or_create(&mut self.peers, peer_id) {
            self.peers.push(peer);
        }
    }
}

/// Outcome of [`find_or_create`].
#[derive(Debug)]
pub enum PeerLookup<'a> {
    /// The peer is already in the list.
    Found(&'a mut Peer),
    /// The peer is not in the list. The caller decides whether to append it.
    Missing(Peer),
}

impl PeerLookup<'_> {
    /// Whether the peer was already in the list.
    pub fn existed(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// The found or transient peer.
    pub fn peer_mut(&mut self) -> &mut Peer {
        match self {
            Self::Found(peer) => peer,
            Self::Missing(peer) => peer,
        }
    }
}

/// Find a peer by ID, or produce a transient one carrying only the ID.
///
/// Never modifies the list.
pub fn find_or_create<'a>(peers: &'a mut [Peer], peer_id: &str) -> PeerLookup<'a> {
    match peers.iter_mut().find(|p| p.peer_id == peer_id) {
        Some(peer) => PeerLookup::Found(peer),
        None => PeerLookup::Missing(Peer::new(peer_id)),
    }
}

/// Whether `edges` already holds an edge symmetric-equal to `candidate`.
pub fn edge_exists(edges: &[Edge], candidate: &Edge) -> bool {
    edges.iter().any(|e| e == candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_normalize_strips_bootstrap_suffix() {
        assert_eq!(normalize_peer_id("peerX-bootstrap"), "peerX");
        assert_eq!(normalize_peer_id("peerX"), "peerX");
        assert_eq!(normalize_peer_id(""), "");
        assert_eq!(normalize_peer_id("-bootstrap"), "");
    }

    #[test]
    fn test_find_or_create_does_not_insert() {
        let mut peers = vec![Peer::new("a")];

        let mut lookup = find_or_create(&mut peers, "a");
        assert!(lookup.existed());
        lookup.peer_mut().transaction_count = 3;
        assert_eq!(peers[0].transaction_count, 3);

        let lookup = find_or_create(&mut peers, "b");
        assert!(!lookup.existed());
        assert_matches::assert_matches!(lookup, PeerLookup::Missing(ref p) if *p == Peer::new("b"));
        assert_eq!(peers.len(), 1);
    }

    #[test]
    fn test_ensure_peer_is_idempotent() {
        let mut topology = NetworkTopology::seed("us", 0);
        topology.ensure_peer("them");
        topology.ensure_peer("them");
        topology.ensure_peer("us");
        let ids: Vec<_> = topology.peers.iter().map(|p| p.peer_id.as_str()).collect();
        assert_eq!(ids, ["us", "them"]);
    }

    #[test]
    fn test_insert_edge_dedups_symmetric() {
        let mut topology = NetworkTopology::seed("us", 0);
        assert!(topology.insert_edge(Edge::new("them", "us")));
        assert!(!topology.insert_edge(Edge::new("us", "them")));
        assert!(!topology.insert_edge(Edge::new("them", "us")));
        assert!(topology.insert_edge(Edge::new("them", "other")));
        assert_eq!(topology.edges.len(), 2);
    }

    #[test]
    fn test_edge_hash_matches_eq() {
        let set: HashSet<Edge> = [Edge::new("a", "b"), Edge::new("b", "a")].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_wire_format() {
        let mut topology = NetworkTopology::seed("us", 5);
        topology.peers.push(Peer {
            node_did: Some("did:nuts:them".into()),
            authenticated: true,
            contact_email: Some("ops@them.example".into()),
            ..Peer::new("them")
        });
        topology.insert_edge(Edge::new("them", "us"));

        let json = serde_json::to_value(&topology).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "edges": [["them", "us"]],
                "peerID": "us",
                "tx_count": 5,
                "peers": [
                    {
                        "peer_id": "us", "address": "", "authenticated": false, "cn": "",
                        "tx_count": 5, "contact_name": "", "contact_phone": "",
                        "contact_web": "", "contact_email": "", "software_version": "",
                        "software_id": ""
                    },
                    {
                        "peer_id": "them", "node_did": "did:nuts:them", "address": "",
                        "authenticated": true, "cn": "", "tx_count": 0, "contact_name": "",
                        "contact_phone": "", "contact_web": "",
                        "contact_email": "ops@them.example", "software_version": "",
                        "software_id": ""
                    }
                ]
            })
        );
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(raw in "[a-zA-Z0-9-]{0,24}(-bootstrap)?[a-z-]{0,12}") {
            let once = normalize_peer_id(&raw);
            prop_assert_eq!(normalize_peer_id(once), once);
            prop_assert!(!once.contains(BOOTSTRAP_SUFFIX));
        }

        #[test]
        fn edges_are_symmetric(a in "[a-z]{1,8}", b in "[a-z]{1,8}") {
            prop_assert_eq!(Edge::new(a.clone(), b.clone()), Edge::new(b.clone(), a.clone()));

            let mut edges = vec![Edge::new(a.clone(), b.clone())];
            prop_assert!(edge_exists(&edges, &Edge::new(b.clone(), a.clone())));
            edges.retain(|e| !e.touches(&a));
            prop_assert!(edges.is_empty());
        }
    }
}
