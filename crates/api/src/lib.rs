//! HTTP API of the monitor.
//!
//! | Route | Response |
//! |---|---|
//! | `GET /web/network_topology` | [`NetworkTopology`](nodescope_topology::NetworkTopology) as JSON |
//! | `GET /web/diagnostics` | The node's own diagnostics |
//! | `GET /health` | `UP` or `DOWN` (503) depending on the node's health |
//! | `GET /status` | `OK` while the process runs |
//! | `GET /metrics` | Prometheus exposition, when a recorder is installed |

mod args;
mod error;
mod handlers;
mod server;

pub use args::{ApiArgs, DEFAULT_API_ADDR, DEFAULT_API_PORT};
pub use error::ApiError;
pub use server::{ApiServer, ApiState, router};
