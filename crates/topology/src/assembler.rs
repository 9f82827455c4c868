//! Merging self-diagnostics and peer diagnostics into one graph.

use nodescope_node_client::{NodeClient, PeerDiagnostics};
use tracing::{debug, warn};

use crate::graph::{Edge, NetworkTopology, Peer, PeerLookup, find_or_create, normalize_peer_id};
use crate::{CertificateReader, TopologyError, TopologyService, subject_from_pem};

impl<C, R> TopologyService<C, R>
where
    C: NodeClient,
    R: CertificateReader,
{
    /// Build the graph from diagnostics without enriching it.
    ///
    /// Returns an error only when one of the two diagnostics calls fails.
    pub async fn assemble(&self) -> Result<NetworkTopology, TopologyError> {
        let diagnostics = self.client.self_diagnostics().await?;
        let mut topology = NetworkTopology::seed(
            diagnostics.own_peer_id(),
            diagnostics.own_transaction_count(),
        );

        // Includes our own connections, seen from the other side.
        let peer_diagnostics = self.client.peer_diagnostics().await?;
        for (raw_id, record) in &peer_diagnostics {
            merge_peer_diagnostics(&mut topology, raw_id, record);
        }

        for connected in diagnostics.connected_peers() {
            let peer_id = normalize_peer_id(&connected.id);
            let mut lookup = find_or_create(&mut topology.peers, peer_id);
            let peer = lookup.peer_mut();
            peer.node_did = connected.node_did.clone();
            peer.address = Some(connected.address.clone()).filter(|a| !a.is_empty());
            peer.authenticated = connected.authenticated;
            if let PeerLookup::Missing(peer) = lookup {
                debug!(peer_id, "Connected peer absent from peer diagnostics");
                topology.peers.push(peer);
            }
        }

        Ok(topology)
    }
}

fn merge_peer_diagnostics(topology: &mut NetworkTopology, raw_id: &str, record: &PeerDiagnostics) {
    let peer_id = normalize_peer_id(raw_id);

    match find_or_create(&mut topology.peers, peer_id) {
        PeerLookup::Found(peer) => apply_peer_diagnostics(peer, record),
        PeerLookup::Missing(mut peer) => {
            apply_peer_diagnostics(&mut peer, record);
            topology.peers.push(peer);
        }
    }

    for connected in record.peers.iter().flatten() {
        let other_id = normalize_peer_id(connected);
        topology.insert_edge(Edge::new(other_id, peer_id));
        topology.ensure_peer(other_id);
    }
}

fn apply_peer_diagnostics(peer: &mut Peer, record: &PeerDiagnostics) {
    if let Some(count) = record.transaction_count() {
        peer.transaction_count = count;
    }
    if let Some(version) = &record.software_version {
        peer.software_version = Some(version.clone());
    }
    if let Some(software_id) = &record.software_id {
        peer.software_id = Some(software_id.clone());
    }
    if let Some(pem) = &record.certificate {
        match subject_from_pem(pem) {
            Ok(subject) => peer.certificate_subject = Some(subject),
            Err(error) => {
                warn!(peer_id = %peer.peer_id, %error, "Failed to parse peer certificate")
            }
        }
    }
}
