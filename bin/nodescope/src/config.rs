//! Figment-based configuration loading.
//!
//! Configuration priority (highest wins):
//! 1. CLI arguments
//! 2. Config file (TOML)
//! 3. Environment variables (`NODESCOPE_` prefix, `__` between section and
//!    key, e.g. `NODESCOPE_NODE__ADDRESS`)
//! 4. Defaults

use std::path::Path;

use eyre::{Result, WrapErr};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use nodescope_api::ApiArgs;
use nodescope_node_client::NodeArgs;
use nodescope_topology::EnrichmentArgs;
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "NODESCOPE_";

/// Complete monitor configuration.
///
/// Unset values are `None` in every section; the section accessors apply
/// the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct NodescopeConfig {
    pub(crate) node: NodeArgs,
    pub(crate) enrichment: EnrichmentArgs,
    pub(crate) api: ApiArgs,
}

impl NodescopeConfig {
    /// Load configuration from defaults, environment and config file, with
    /// `overrides` from the command line on top.
    pub(crate) fn load(config_path: &Path, overrides: &Self) -> Result<Self> {
        Self::figment(config_path, overrides)
            .extract()
            .wrap_err("Failed to load configuration")
    }

    fn figment(config_path: &Path, overrides: &Self) -> Figment {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        if config_path.exists() {
            figment = figment.merge(Toml::file(config_path));
        }

        figment.merge(Serialized::defaults(overrides))
    }
}
