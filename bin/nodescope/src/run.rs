//! Process wiring: logging, configuration, services and the API server.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use nodescope_api::{ApiServer, ApiState, router};
use nodescope_node_client::HttpNodeClient;
use nodescope_observability::{init_logging, install_prometheus_recorder};
use nodescope_topology::{TlsCertificateReader, TopologyService};
use tracing::{error, info};

use crate::cli::Cli;
use crate::config::NodescopeConfig;

const METRICS_UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Run the monitor until Ctrl-C.
pub(crate) async fn run() -> eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(&cli.logs)?;

    info!("Starting nodescope {}", env!("CARGO_PKG_VERSION"));

    let config = NodescopeConfig::load(&cli.config, &cli.overrides())?;
    info!(
        node = config.node.address(),
        internal = config.node.internal_address(),
        certificate_trust = ?config.enrichment.certificate_trust(),
        "Loaded configuration"
    );

    let recorder = install_prometheus_recorder()?;
    recorder.spawn_upkeep(METRICS_UPKEEP_INTERVAL);

    let client = HttpNodeClient::new(&config.node)?;
    let certificates = TlsCertificateReader::new(config.enrichment.certificate_trust())?;
    let topology = Arc::new(TopologyService::new(
        client,
        certificates,
        &config.enrichment,
    ));

    let app = router(ApiState {
        topology,
        metrics: Some(recorder),
    });
    ApiServer::bind(config.api.socket_addr(), app)
        .await?
        .serve(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C, shutting down"),
        Err(error) => {
            error!(%error, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}
