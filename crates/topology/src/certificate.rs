//! Reading X.509 subjects from PEM text and from live TLS endpoints.
//!
//! Certificates read over TLS are only displayed, never trusted. The default
//! [`CertificateTrust::SkipVerification`] therefore completes the handshake
//! without validating the chain, which means the value read can be forged by
//! anyone able to intercept the connection.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use clap::ValueEnum;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::{trace, warn};
use x509_parser::prelude::*;

/// Errors from certificate parsing and reading.
#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("invalid PEM: {0}")]
    Pem(String),

    #[error("invalid X.509 certificate: {0}")]
    X509(String),

    #[error("invalid address {0}")]
    Address(String),

    #[error("failed to connect over TCP to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("TLS handshake with {addr} failed: {source}")]
    Handshake {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("{0} presented no certificate")]
    NoCertificate(String),

    #[error("TLS configuration error: {0}")]
    Config(#[from] rustls::Error),
}

/// Subject DN of the first certificate in a PEM document.
pub fn subject_from_pem(pem: &str) -> Result<String, CertificateError> {
    let (_, pem) = x509_parser::pem::parse_x509_pem(pem.as_bytes())
        .map_err(|e| CertificateError::Pem(e.to_string()))?;
    subject_from_der(&pem.contents)
}

/// Subject DN of a DER encoded certificate.
pub fn subject_from_der(der: &[u8]) -> Result<String, CertificateError> {
    let (_, cert) =
        X509Certificate::from_der(der).map_err(|e| CertificateError::X509(e.to_string()))?;
    Ok(cert.subject().to_string())
}

/// How the certificate presented by a peer is checked before it is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CertificateTrust {
    /// Accept any certificate. Reads always succeed, but the value is not
    /// authenticated.
    #[default]
    SkipVerification,
    /// Validate against the Mozilla root store. Peers with private CAs fail.
    WebPki,
}

/// Reads the subject of the certificate a TLS endpoint presents.
#[async_trait]
pub trait CertificateReader: Send + Sync {
    /// Connect to `addr` (`host:port`) and return the subject DN of the
    /// leaf certificate.
    async fn read_subject(&self, addr: &str) -> Result<String, CertificateError>;
}

#[async_trait]
impl<T: CertificateReader + ?Sized> CertificateReader for Arc<T> {
    async fn read_subject(&self, addr: &str) -> Result<String, CertificateError> {
        (**self).read_subject(addr).await
    }
}

/// [`CertificateReader`] performing a rustls client handshake.
#[derive(Clone)]
pub struct TlsCertificateReader {
    connector: TlsConnector,
    trust: CertificateTrust,
}

impl std::fmt::Debug for TlsCertificateReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsCertificateReader")
            .field("trust", &self.trust)
            .finish()
    }
}

impl TlsCertificateReader {
    pub fn new(trust: CertificateTrust) -> Result<Self, CertificateError> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let builder = ClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()?;

        let config = match trust {
            CertificateTrust::SkipVerification => {
                warn!("Peer certificates are read without verification");
                builder
                    .dangerous()
                    .with_custom_certificate_verifier(Arc::new(SkipServerVerification(provider)))
                    .with_no_client_auth()
            }
            CertificateTrust::WebPki => {
                let mut roots = RootCertStore::empty();
                roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
                builder
                    .with_root_certificates(roots)
                    .with_no_client_auth()
            }
        };

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            trust,
        })
    }

    pub fn trust(&self) -> CertificateTrust {
        self.trust
    }
}

#[async_trait]
impl CertificateReader for TlsCertificateReader {
    async fn read_subject(&self, addr: &str) -> Result<String, CertificateError> {
        let server_name = server_name(addr)?;

        let tcp = TcpStream::connect(addr)
            .await
            .map_err(|source| CertificateError::Connect {
                addr: addr.to_string(),
                source,
            })?;
        let stream = self
            .connector
            .connect(server_name, tcp)
            .await
            .map_err(|source| CertificateError::Handshake {
                addr: addr.to_string(),
                source,
            })?;

        let (_, session) = stream.get_ref();
        let subject = match session.peer_certificates().and_then(|certs| certs.first()) {
            Some(leaf) => subject_from_der(leaf.as_ref()),
            None => Err(CertificateError::NoCertificate(addr.to_string())),
        };
        drop(stream);

        trace!(%addr, "Closed TLS connection after reading certificate");
        subject
    }
}

fn server_name(addr: &str) -> Result<ServerName<'static>, CertificateError> {
    let (host, _) = addr
        .rsplit_once(':')
        .ok_or_else(|| CertificateError::Address(addr.to_string()))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    ServerName::try_from(host.to_string()).map_err(|_| CertificateError::Address(addr.to_string()))
}

/// Accepts any server certificate while still checking handshake signatures.
#[derive(Debug)]
struct SkipServerVerification(Arc<CryptoProvider>);

impl ServerCertVerifier for SkipServerVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};
    use rustls::ServerConfig;
    use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
    use tokio::net::TcpListener;
    use tokio_rustls::TlsAcceptor;

    fn self_signed(common_name: &str) -> (rcgen::Certificate, KeyPair) {
        let mut params = CertificateParams::new(vec!["localhost".to_string()]).unwrap();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, common_name);
        params.distinguished_name = dn;
        let key = KeyPair::generate().unwrap();
        let cert = params.self_signed(&key).unwrap();
        (cert, key)
    }

    /// Serve TLS on a local port until the test ends.
    async fn tls_server(common_name: &str) -> String {
        let (cert, key) = self_signed(common_name);
        let config = ServerConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(
            vec![cert.der().clone()],
            PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key.serialize_der())),
        )
        .unwrap();
        let acceptor = TlsAcceptor::from(Arc::new(config));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            while let Ok((tcp, _)) = listener.accept().await {
                let acceptor = acceptor.clone();
                tokio::spawn(async move {
                    let _ = acceptor.accept(tcp).await;
                });
            }
        });
        addr
    }

    #[test]
    fn test_subject_from_pem() {
        let (cert, _) = self_signed("node-b.example.org");
        assert_eq!(
            subject_from_pem(&cert.pem()).unwrap(),
            "CN=node-b.example.org"
        );
    }

    #[test]
    fn test_subject_from_malformed_pem() {
        assert_matches!(
            subject_from_pem("not a certificate"),
            Err(CertificateError::Pem(_))
        );
        let garbage = "-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----\n";
        assert_matches!(subject_from_pem(garbage), Err(CertificateError::X509(_)));
    }

    #[test]
    fn test_server_name() {
        assert!(server_name("localhost:5555").is_ok());
        assert!(server_name("[::1]:5555").is_ok());
        assert_matches!(server_name("localhost"), Err(CertificateError::Address(_)));
    }

    #[tokio::test]
    async fn test_read_subject_without_verification() {
        let addr = tls_server("node-b.example.org").await;
        let reader = TlsCertificateReader::new(CertificateTrust::SkipVerification).unwrap();

        let subject = reader.read_subject(&addr).await.unwrap();
        assert_eq!(subject, "CN=node-b.example.org");
    }

    #[tokio::test]
    async fn test_read_subject_webpki_rejects_self_signed() {
        let addr = tls_server("node-b.example.org").await;
        let reader = TlsCertificateReader::new(CertificateTrust::WebPki).unwrap();

        assert_matches!(
            reader.read_subject(&addr).await,
            Err(CertificateError::Handshake { .. })
        );
    }

    #[tokio::test]
    async fn test_read_subject_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let reader = TlsCertificateReader::new(CertificateTrust::SkipVerification).unwrap();
        assert_matches!(
            reader.read_subject(&addr).await,
            Err(CertificateError::Connect { .. })
        );
    }
}
