//! Process-wide logging and metrics setup.
//!
//! Both are global: call [`init_logging`] and [`install_prometheus_recorder`]
//! once, early in `main`.

mod args;
mod logging;
mod prometheus;

pub use args::LogArgs;
pub use logging::{build_filter, init_logging};
pub use prometheus::{PrometheusRecorder, install_prometheus_recorder};
