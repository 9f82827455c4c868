//! HTTP server for the monitor API.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use nodescope_node_client::NodeClient;
use nodescope_observability::PrometheusRecorder;
use nodescope_topology::{CertificateReader, TopologyService};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers;

/// Shared state of all routes.
#[derive(Debug)]
pub struct ApiState<C, R> {
    pub topology: Arc<TopologyService<C, R>>,
    /// Source for `/metrics`. The route answers 404 without one.
    pub metrics: Option<PrometheusRecorder>,
}

/// Build the API router.
pub fn router<C, R>(state: ApiState<C, R>) -> Router
where
    C: NodeClient + 'static,
    R: CertificateReader + 'static,
{
    Router::new()
        .route(
            "/web/network_topology",
            get(handlers::network_topology::<C, R>),
        )
        .route("/web/diagnostics", get(handlers::diagnostics::<C, R>))
        .route("/health", get(handlers::health::<C, R>))
        .route("/status", get(handlers::status))
        .route("/metrics", get(handlers::metrics::<C, R>))
        .with_state(Arc::new(state))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// API server bound to its listening socket.
#[derive(Debug)]
pub struct ApiServer {
    listener: TcpListener,
    router: Router,
}

impl ApiServer {
    pub async fn bind(addr: SocketAddr, router: Router) -> eyre::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, router })
    }

    pub fn local_addr(&self) -> eyre::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until `shutdown` completes, then drain in-flight requests.
    pub async fn serve<F>(self, shutdown: F) -> eyre::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(addr = %self.local_addr()?, "API server listening");
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("API server stopped");
        Ok(())
    }
}
