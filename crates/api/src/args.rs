//! HTTP API CLI arguments.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Args;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
pub const DEFAULT_API_PORT: u16 = 1313;

/// HTTP API configuration.
#[derive(Debug, Args, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[command(next_help_heading = "API")]
#[serde(default)]
pub struct ApiArgs {
    /// Address the HTTP API listens on.
    #[arg(long = "api.addr", value_name = "ADDR")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addr: Option<IpAddr>,

    /// Port the HTTP API listens on.
    #[arg(long = "api.port", value_name = "PORT")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl ApiArgs {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(
            self.addr.unwrap_or(DEFAULT_API_ADDR),
            self.port.unwrap_or(DEFAULT_API_PORT),
        )
    }
}
