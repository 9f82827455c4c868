//! In-memory node and certificate doubles for tests.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use nodescope_node_client::{
    ClientError, ConnectedPeer, ConnectionsDiagnostics, DidDocument, Health, NetworkDiagnostics,
    NodeClient, PeerDiagnostics, SelfDiagnostics, Service, StateDiagnostics,
};
use serde_json::Value;
use tokio::sync::watch;

use crate::{CertificateError, CertificateReader};

/// Holds calls until released, counting how many have arrived.
#[derive(Debug, Clone)]
pub struct Gate(Arc<GateState>);

#[derive(Debug)]
struct GateState {
    released: watch::Sender<bool>,
    entered: watch::Sender<usize>,
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

impl Gate {
    pub fn new() -> Self {
        Self(Arc::new(GateState {
            released: watch::Sender::new(false),
            entered: watch::Sender::new(0),
        }))
    }

    /// Let every held and future call through.
    pub fn release(&self) {
        self.0.released.send_replace(true);
    }

    /// Number of calls that reached the gate.
    pub fn entered(&self) -> usize {
        *self.0.entered.borrow()
    }

    /// Wait until at least `count` calls reached the gate.
    pub async fn wait_entered(&self, count: usize) {
        let mut entered = self.0.entered.subscribe();
        let _ = entered.wait_for(|n| *n >= count).await;
    }

    async fn pass(&self) {
        let mut released = self.0.released.subscribe();
        self.0.entered.send_modify(|n| *n += 1);
        let _ = released.wait_for(|r| *r).await;
    }
}

/// [`NodeClient`] answering from fixed data.
///
/// Unknown DIDs resolve to a 404.
#[derive(Debug, Default)]
pub struct MockNode {
    diagnostics: SelfDiagnostics,
    peers: HashMap<String, PeerDiagnostics>,
    documents: HashMap<String, DidDocument>,
    health: Option<Health>,
    fail_self_diagnostics: bool,
    fail_peer_diagnostics: bool,
    document_gate: Option<Gate>,
    document_calls: AtomicUsize,
}

impl MockNode {
    pub fn new(diagnostics: SelfDiagnostics) -> Self {
        Self {
            diagnostics,
            ..Default::default()
        }
    }

    pub fn with_peer(mut self, raw_id: &str, record: PeerDiagnostics) -> Self {
        self.peers.insert(raw_id.to_string(), record);
        self
    }

    pub fn with_document(mut self, document: DidDocument) -> Self {
        self.documents.insert(document.id.clone(), document);
        self
    }

    /// Hold every document fetch at `gate`.
    pub fn with_document_gate(mut self, gate: Gate) -> Self {
        self.document_gate = Some(gate);
        self
    }

    pub fn with_health(mut self, health: Health) -> Self {
        self.health = Some(health);
        self
    }

    pub fn failing_self_diagnostics(mut self) -> Self {
        self.fail_self_diagnostics = true;
        self
    }

    pub fn failing_peer_diagnostics(mut self) -> Self {
        self.fail_peer_diagnostics = true;
        self
    }

    pub fn document_calls(&self) -> usize {
        self.document_calls.load(Ordering::SeqCst)
    }
}

fn status_error(status: u16) -> ClientError {
    ClientError::UnexpectedStatus {
        status,
        expected: 200,
        body: String::new(),
    }
}

#[async_trait]
impl NodeClient for MockNode {
    async fn self_diagnostics(&self) -> Result<SelfDiagnostics, ClientError> {
        if self.fail_self_diagnostics {
            return Err(status_error(500));
        }
        Ok(self.diagnostics.clone())
    }

    async fn peer_diagnostics(&self) -> Result<HashMap<String, PeerDiagnostics>, ClientError> {
        if self.fail_peer_diagnostics {
            return Err(status_error(500));
        }
        Ok(self.peers.clone())
    }

    async fn document(&self, did: &str) -> Result<DidDocument, ClientError> {
        self.document_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.document_gate {
            gate.pass().await;
        }
        self.documents
            .get(did)
            .cloned()
            .ok_or_else(|| status_error(404))
    }

    async fn check_health(&self) -> Result<Health, ClientError> {
        match &self.health {
            Some(health) => Ok(health.clone()),
            None => Err(status_error(500)),
        }
    }
}

/// [`CertificateReader`] returning fixed subjects per address.
///
/// Unknown addresses fail as if the connection was refused.
#[derive(Debug, Default)]
pub struct MockCertificates {
    subjects: HashMap<String, String>,
    gates: HashMap<String, Gate>,
    default_gate: Option<Gate>,
    reads: AtomicUsize,
}

impl MockCertificates {
    pub fn with_subject(mut self, addr: &str, subject: &str) -> Self {
        self.subjects.insert(addr.to_string(), subject.to_string());
        self
    }

    /// Hold reads of `addr` at `gate`.
    pub fn with_gate(mut self, addr: &str, gate: Gate) -> Self {
        self.gates.insert(addr.to_string(), gate);
        self
    }

    /// Hold reads of every address without its own gate.
    pub fn with_default_gate(mut self, gate: Gate) -> Self {
        self.default_gate = Some(gate);
        self
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CertificateReader for MockCertificates {
    async fn read_subject(&self, addr: &str) -> Result<String, CertificateError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = self.gates.get(addr).or(self.default_gate.as_ref()) {
            gate.pass().await;
        }
        self.subjects
            .get(addr)
            .cloned()
            .ok_or_else(|| CertificateError::Connect {
                addr: addr.to_string(),
                source: io::ErrorKind::ConnectionRefused.into(),
            })
    }
}

/// A live connection of the local node, listening on `{id}:5555`.
pub fn connected(id: &str, node_did: Option<&str>, authenticated: bool) -> ConnectedPeer {
    ConnectedPeer {
        id: id.to_string(),
        address: format!("{id}:5555"),
        node_did: node_did.map(str::to_string),
        authenticated,
    }
}

pub fn self_diagnostics(
    peer_id: &str,
    transaction_count: u64,
    connected_peers: Vec<ConnectedPeer>,
) -> SelfDiagnostics {
    SelfDiagnostics {
        network: NetworkDiagnostics {
            connections: ConnectionsDiagnostics {
                peer_id: peer_id.to_string(),
                connected_peers_count: Some(connected_peers.len() as u64),
                connected_peers,
            },
            state: StateDiagnostics {
                transaction_count,
                ..Default::default()
            },
            ..Default::default()
        },
        ..Default::default()
    }
}

/// A node DID document with optional `NutsComm` and contact info services.
pub fn node_document(did: &str, comm: Option<&str>, contact: Option<Value>) -> DidDocument {
    let mut service = Vec::new();
    if let Some(endpoint) = comm {
        service.push(Service {
            id: format!("{did}#comm"),
            kind: crate::COMM_SERVICE.to_string(),
            endpoint: Value::String(endpoint.to_string()),
        });
    }
    if let Some(endpoint) = contact {
        service.push(Service {
            id: format!("{did}#contact"),
            kind: crate::CONTACT_INFO_SERVICE.to_string(),
            endpoint,
        });
    }
    DidDocument {
        id: did.to_string(),
        service,
    }
}

/// PEM of a fresh self-signed certificate with the given common name.
#[cfg(test)]
pub(crate) fn pem_for(common_name: &str) -> String {
    let mut params = rcgen::CertificateParams::new(vec![common_name.to_string()]).unwrap();
    let mut dn = rcgen::DistinguishedName::new();
    dn.push(rcgen::DnType::CommonName, common_name);
    params.distinguished_name = dn;
    let key = rcgen::KeyPair::generate().unwrap();
    params.self_signed(&key).unwrap().pem()
}
