//! Top-level CLI parser.

use std::path::PathBuf;

use clap::Parser;
use nodescope_api::ApiArgs;
use nodescope_node_client::NodeArgs;
use nodescope_observability::LogArgs;
use nodescope_topology::EnrichmentArgs;

use crate::config::NodescopeConfig;

/// Config file read when `--config` is not given.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "nodescope.toml";

/// nodescope - network topology monitor for a node and its peers
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// Logging configuration.
    #[command(flatten)]
    pub(crate) logs: LogArgs,

    /// Path to a TOML config file. Ignored when the file does not exist.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub(crate) config: PathBuf,

    /// Node connection.
    #[command(flatten)]
    pub(crate) node: NodeArgs,

    /// Peer enrichment.
    #[command(flatten)]
    pub(crate) enrichment: EnrichmentArgs,

    /// HTTP API.
    #[command(flatten)]
    pub(crate) api: ApiArgs,
}

impl Cli {
    /// Values given on the command line, as a config layer.
    pub(crate) fn overrides(&self) -> NodescopeConfig {
        NodescopeConfig {
            node: self.node.clone(),
            enrichment: self.enrichment.clone(),
            api: self.api.clone(),
        }
    }
}
