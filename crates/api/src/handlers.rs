//! Route handlers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use nodescope_node_client::{Health, HealthCheckResult, NodeClient, SelfDiagnostics};
use nodescope_topology::{CertificateReader, NetworkTopology};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::{ApiError, ApiState};

pub(crate) const STATUS_UP: &str = "UP";
pub(crate) const STATUS_DOWN: &str = "DOWN";
const STATUS_UNKNOWN: &str = "UNKNOWN";

pub(crate) async fn network_topology<C, R>(
    State(state): State<Arc<ApiState<C, R>>>,
) -> Result<Json<NetworkTopology>, ApiError>
where
    C: NodeClient + 'static,
    R: CertificateReader + 'static,
{
    // The handler future is dropped when the client goes away.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let topology = state.topology.network_topology(&cancel).await?;
    Ok(Json(topology))
}

pub(crate) async fn diagnostics<C, R>(
    State(state): State<Arc<ApiState<C, R>>>,
) -> Result<Json<SelfDiagnostics>, ApiError>
where
    C: NodeClient + 'static,
    R: CertificateReader + 'static,
{
    let diagnostics = state.topology.client().self_diagnostics().await?;
    Ok(Json(diagnostics))
}

/// `UP` only when the node itself reports `UP`.
pub(crate) async fn health<C, R>(State(state): State<Arc<ApiState<C, R>>>) -> Response
where
    C: NodeClient + 'static,
    R: CertificateReader + 'static,
{
    let node = match state.topology.client().check_health().await {
        Ok(health) => HealthCheckResult {
            status: health.status,
            details: None,
        },
        Err(error) => {
            warn!(%error, "Node health check failed");
            HealthCheckResult {
                status: STATUS_UNKNOWN.to_string(),
                details: Some(Value::String(error.to_string())),
            }
        }
    };

    let (code, status) = if node.status == STATUS_UP {
        (StatusCode::OK, STATUS_UP)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, STATUS_DOWN)
    };
    let body = Health {
        status: status.to_string(),
        details: Some(HashMap::from([("node".to_string(), node)])),
    };
    (code, Json(body)).into_response()
}

pub(crate) async fn status() -> &'static str {
    "OK"
}

pub(crate) async fn metrics<C, R>(State(state): State<Arc<ApiState<C, R>>>) -> Response
where
    C: NodeClient + 'static,
    R: CertificateReader + 'static,
{
    match &state.metrics {
        Some(recorder) => recorder.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics are disabled").into_response(),
    }
}
