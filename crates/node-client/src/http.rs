//! reqwest-backed [`NodeClient`].

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{StatusCode, header::ACCEPT};
use serde::de::DeserializeOwned;
use tracing::trace;
use url::Url;

use crate::{
    ClientError, DidDocument, DidResolutionResult, Health, NodeArgs, NodeClient, PeerDiagnostics,
    SelfDiagnostics,
};

const DIAGNOSTICS_PATH: &[&str] = &["status", "diagnostics"];
const HEALTH_PATH: &[&str] = &["health"];
const PEER_DIAGNOSTICS_PATH: &[&str] = &["internal", "network", "v1", "diagnostics", "peers"];
const VDR_DID_PATH: &[&str] = &["internal", "vdr", "v1", "did"];

/// HTTP client for a single node.
///
/// Cheap to clone; the underlying connection pool is shared, so one instance
/// serves any number of concurrent callers.
#[derive(Debug, Clone)]
pub struct HttpNodeClient {
    http: reqwest::Client,
    /// Base URL of the public interface.
    public: Url,
    /// Base URL of the `/internal` interface.
    internal: Url,
}

impl HttpNodeClient {
    /// Build a client from connection arguments.
    pub fn new(args: &NodeArgs) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(args.request_timeout())
            .build()?;

        Ok(Self {
            http,
            public: parse_base(args.address())?,
            internal: parse_base(args.internal_address())?,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        let (status, body) = self.get(url).await?;
        expect_status(StatusCode::OK, status, &body)?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn get(&self, url: Url) -> Result<(StatusCode, Vec<u8>), ClientError> {
        trace!(%url, "GET");
        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok((status, body.to_vec()))
    }
}

#[async_trait]
impl NodeClient for HttpNodeClient {
    async fn self_diagnostics(&self) -> Result<SelfDiagnostics, ClientError> {
        self.get_json(endpoint(&self.public, DIAGNOSTICS_PATH, None)?)
            .await
    }

    async fn peer_diagnostics(&self) -> Result<HashMap<String, PeerDiagnostics>, ClientError> {
        self.get_json(endpoint(&self.internal, PEER_DIAGNOSTICS_PATH, None)?)
            .await
    }

    async fn document(&self, did: &str) -> Result<DidDocument, ClientError> {
        let result: DidResolutionResult = self
            .get_json(endpoint(&self.internal, VDR_DID_PATH, Some(did))?)
            .await?;
        Ok(result.document)
    }

    async fn check_health(&self) -> Result<Health, ClientError> {
        let (status, body) = self.get(endpoint(&self.public, HEALTH_PATH, None)?).await?;
        // A node that is down still describes why in the body.
        if status != StatusCode::SERVICE_UNAVAILABLE {
            expect_status(StatusCode::OK, status, &body)?;
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

fn parse_base(addr: &str) -> Result<Url, ClientError> {
    let url = Url::parse(addr).map_err(|e| ClientError::InvalidUrl(format!("{addr}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(ClientError::InvalidUrl(addr.to_string()));
    }
    Ok(url)
}

/// Append path segments (and an optional percent-encoded trailing segment) to
/// a base URL, keeping any path prefix the base already carries.
fn endpoint(base: &Url, segments: &[&str], last: Option<&str>) -> Result<Url, ClientError> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(base.to_string()))?;
        path.pop_if_empty().extend(segments);
        if let Some(last) = last {
            path.push(last);
        }
    }
    Ok(url)
}

fn expect_status(expected: StatusCode, status: StatusCode, body: &[u8]) -> Result<(), ClientError> {
    if status == expected {
        return Ok(());
    }
    Err(ClientError::UnexpectedStatus {
        status: status.as_u16(),
        expected: expected.as_u16(),
        body: String::from_utf8_lossy(body).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HttpNodeClient {
        HttpNodeClient::new(&NodeArgs {
            address: Some(server.uri()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let base = Url::parse("http://node:1323/prefix/").unwrap();
        let url = endpoint(&base, VDR_DID_PATH, Some("did:nuts:abc")).unwrap();
        assert_eq!(
            url.as_str(),
            "http://node:1323/prefix/internal/vdr/v1/did/did:nuts:abc"
        );

        let base = Url::parse("http://node:1323").unwrap();
        let url = endpoint(&base, DIAGNOSTICS_PATH, None).unwrap();
        assert_eq!(url.as_str(), "http://node:1323/status/diagnostics");
    }

    #[test]
    fn test_invalid_address() {
        let result = HttpNodeClient::new(&NodeArgs {
            address: Some("not a url".into()),
            ..Default::default()
        });
        assert_matches!(result, Err(ClientError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_self_diagnostics() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status/diagnostics"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "network": {
                    "connections": {"peer_id": "us", "connected_peers": []},
                    "state": {"transaction_count": 5}
                }
            })))
            .mount(&server)
            .await;

        let diagnostics = client_for(&server).self_diagnostics().await.unwrap();
        assert_eq!(diagnostics.own_peer_id(), "us");
        assert_eq!(diagnostics.own_transaction_count(), 5);
    }

    #[tokio::test]
    async fn test_self_diagnostics_without_connections() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status/diagnostics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "network": {
                    "connections": {
                        "connected_peers": null,
                        "connected_peers_count": 0,
                        "peer_id": "us"
                    },
                    "state": {"transaction_count": 0}
                }
            })))
            .mount(&server)
            .await;

        let diagnostics = client_for(&server).self_diagnostics().await.unwrap();
        assert_eq!(diagnostics.own_peer_id(), "us");
        assert!(diagnostics.network.connections.connected_peers.is_empty());
    }

    #[tokio::test]
    async fn test_document_without_services() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/internal/vdr/v1/did/did:nuts:bare"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "document": {"id": "did:nuts:bare", "service": null},
                "documentMetadata": {}
            })))
            .mount(&server)
            .await;

        let document = client_for(&server).document("did:nuts:bare").await.unwrap();
        assert_eq!(document.id, "did:nuts:bare");
        assert!(document.service.is_empty());
    }

    #[tokio::test]
    async fn test_peer_diagnostics_uses_internal_address() {
        let public = MockServer::start().await;
        let internal = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/internal/network/v1/diagnostics/peers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "them": {"peers": ["us"]}
            })))
            .expect(1)
            .mount(&internal)
            .await;

        let client = HttpNodeClient::new(&NodeArgs {
            address: Some(public.uri()),
            internal_address: Some(internal.uri()),
            ..Default::default()
        })
        .unwrap();

        let peers = client.peer_diagnostics().await.unwrap();
        assert_eq!(peers.len(), 1);
        assert_eq!(peers["them"].peers.as_deref().map(<[String]>::len), Some(1));
    }

    #[tokio::test]
    async fn test_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/internal/vdr/v1/did/did:nuts:them"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "document": {"id": "did:nuts:them", "service": []},
                "documentMetadata": {}
            })))
            .mount(&server)
            .await;

        let document = client_for(&server).document("did:nuts:them").await.unwrap();
        assert_eq!(document.id, "did:nuts:them");
        assert!(document.service.is_empty());
    }

    #[tokio::test]
    async fn test_unexpected_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/internal/vdr/v1/did/did:nuts:missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .document("did:nuts:missing")
            .await
            .unwrap_err();
        assert_matches!(
            err,
            ClientError::UnexpectedStatus { status: 404, expected: 200, ref body } if body == "not found"
        );
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status/diagnostics"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{"))
            .mount(&server)
            .await;

        let err = client_for(&server).self_diagnostics().await.unwrap_err();
        assert_matches!(err, ClientError::Decode(_));
    }

    #[tokio::test]
    async fn test_health_down_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({
                "status": "DOWN",
                "details": {"network.tls": {"status": "DOWN", "details": "expired"}}
            })))
            .mount(&server)
            .await;

        let health = client_for(&server).check_health().await.unwrap();
        assert_eq!(health.status, "DOWN");
        assert_eq!(health.details.unwrap()["network.tls"].status, "DOWN");
    }
}
