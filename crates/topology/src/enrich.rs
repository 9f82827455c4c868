//! Concurrent enrichment of peers with contact details and certificate
//! subjects.
//!
//! One unit runs per authenticated peer with a node DID. A unit fetches the
//! DID document, copies the contact details, resolves the `NutsComm` address
//! and reads the certificate presented there. All units run concurrently on
//! the calling task and each holds the only mutable reference to its own
//! peer, so records are updated in place without locking. The certificate
//! read is part of the unit's future, which makes the single join over all
//! units also the join over every certificate read.

use std::future::Future;

use futures::future::join_all;
use nodescope_node_client::NodeClient;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::document::{comm_address, contact_info};
use crate::{CertificateReader, Peer, TopologyService};

impl<C, R> TopologyService<C, R>
where
    C: NodeClient,
    R: CertificateReader,
{
    /// Enrich every authenticated peer that has a node DID.
    ///
    /// Returns once all units have finished. Failures are logged and only
    /// leave the affected peer's fields unset. Dropping the returned future
    /// aborts all outstanding lookups; fields already written stay valid.
    pub async fn enrich(&self, peers: &mut [Peer]) {
        let units: Vec<_> = peers
            .iter_mut()
            .filter_map(|peer| {
                if !peer.is_enrichable() {
                    if peer.authenticated {
                        debug!(peer_id = %peer.peer_id, "Authenticated peer without node DID");
                    }
                    return None;
                }
                let did = peer.node_did.clone()?;
                Some(self.enrich_peer(peer, did))
            })
            .collect();

        debug!(units = units.len(), "Enriching peers");
        self.metrics.enriched_peers_total.increment(units.len() as u64);
        join_all(units).await;
    }

    async fn enrich_peer(&self, peer: &mut Peer, did: String) {
        let document = match self.bounded(self.client.document(&did)).await {
            Ok(Ok(document)) => document,
            Ok(Err(error)) => {
                self.metrics.document_failures_total.increment(1);
                warn!(peer_id = %peer.peer_id, %did, %error, "Failed to retrieve DID document");
                return;
            }
            Err(_) => {
                self.metrics.document_failures_total.increment(1);
                warn!(peer_id = %peer.peer_id, %did, timeout = ?self.unit_timeout, "Timed out retrieving DID document");
                return;
            }
        };

        if let Some(contact) = contact_info(&document) {
            peer.contact_name = contact.name;
            peer.contact_phone = contact.phone;
            peer.contact_web = contact.website;
            peer.contact_email = contact.email;
        }

        let addr = match comm_address(&document) {
            Ok(addr) => addr,
            Err(error) => {
                warn!(peer_id = %peer.peer_id, %did, %error, "Failed to extract NutsComm address from DID document");
                return;
            }
        };

        match self.bounded(self.certificates.read_subject(&addr)).await {
            Ok(Ok(subject)) => {
                trace!(peer_id = %peer.peer_id, %addr, %subject, "Read peer certificate");
                peer.certificate_subject = Some(subject);
            }
            Ok(Err(error)) => {
                self.metrics.certificate_failures_total.increment(1);
                warn!(peer_id = %peer.peer_id, %addr, %error, "Failed to read peer certificate");
            }
            Err(_) => {
                self.metrics.certificate_failures_total.increment(1);
                warn!(peer_id = %peer.peer_id, %addr, timeout = ?self.unit_timeout, "Timed out reading peer certificate");
            }
        }
    }

    fn bounded<F: Future>(&self, fut: F) -> tokio::time::Timeout<F> {
        timeout(self.unit_timeout, fut)
    }
}
