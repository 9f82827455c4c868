//! Node connection CLI arguments.

use std::time::Duration;

use clap::Args;
use serde::{Deserialize, Serialize};

/// Default address of the node's public HTTP interface.
pub const DEFAULT_NODE_ADDRESS: &str = "http://localhost:1323";

/// Default timeout for a single request to the node.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Connection settings for the monitored node.
///
/// Every field is optional so that only values given on the command line
/// override the config file; accessors apply the defaults.
#[derive(Debug, Args, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[command(next_help_heading = "Node")]
#[serde(default)]
pub struct NodeArgs {
    /// Address of the node's HTTP interface (diagnostics, health).
    #[arg(long = "node.address", value_name = "URL")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Address for calls to `/internal` endpoints, when they are bound to a
    /// separate interface. Falls back to `--node.address`.
    #[arg(long = "node.internal-address", value_name = "URL")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_address: Option<String>,

    /// Timeout for a single request to the node.
    #[arg(long = "node.request-timeout", value_name = "SECONDS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl NodeArgs {
    /// Address of the public interface.
    pub fn address(&self) -> &str {
        self.address.as_deref().unwrap_or(DEFAULT_NODE_ADDRESS)
    }

    /// Address of the internal interface.
    pub fn internal_address(&self) -> &str {
        match self.internal_address.as_deref() {
            Some(addr) if !addr.is_empty() => addr,
            _ => self.address(),
        }
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = NodeArgs::default();
        assert_eq!(args.address(), DEFAULT_NODE_ADDRESS);
        assert_eq!(args.internal_address(), DEFAULT_NODE_ADDRESS);
        assert_eq!(args.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_internal_address_falls_back_when_empty() {
        let args = NodeArgs {
            address: Some("http://node:1323".into()),
            internal_address: Some(String::new()),
            request_timeout_secs: None,
        };
        assert_eq!(args.internal_address(), "http://node:1323");

        let args = NodeArgs {
            internal_address: Some("http://node:8081".into()),
            ..args
        };
        assert_eq!(args.internal_address(), "http://node:8081");
    }
}
