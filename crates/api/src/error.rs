use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use nodescope_node_client::ClientError;
use nodescope_topology::TopologyError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failure of an API call that depends on the node.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error("failed to query node: {0}")]
    Node(#[from] ClientError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self, "API request failed");
        let message = self.to_string();
        (StatusCode::BAD_GATEWAY, Json(json!({ "error": message }))).into_response()
    }
}
