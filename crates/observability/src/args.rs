//! Logging CLI arguments.

use clap::Args;
use serde::{Deserialize, Serialize};

/// Logging configuration.
#[derive(Debug, Args, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[command(next_help_heading = "Logging")]
#[serde(default)]
pub struct LogArgs {
    /// Silence all output except errors.
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose mode (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    #[serde(skip)] // CLI-only
    pub verbosity: u8,

    /// Log filter directive (e.g., "nodescope_topology=trace,hyper=warn").
    #[arg(long = "log.filter", value_name = "DIRECTIVE")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Use JSON format for log output.
    #[arg(long = "log.json")]
    pub json: bool,
}

impl LogArgs {
    /// Default level when `RUST_LOG` is not set.
    pub fn base_level(&self) -> &'static str {
        match (self.quiet, self.verbosity) {
            (true, _) => "error",
            (false, 0) => "info",
            (false, 1) => "debug",
            (false, _) => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        log: LogArgs,
    }

    #[test]
    fn test_verbosity_levels() {
        let level = |args: &[&str]| {
            Cli::parse_from(std::iter::once("nodescope").chain(args.iter().copied()))
                .log
                .base_level()
        };
        assert_eq!(level(&[]), "info");
        assert_eq!(level(&["-v"]), "debug");
        assert_eq!(level(&["-vvv"]), "trace");
        assert_eq!(level(&["-q", "-vv"]), "error");
    }

    #[test]
    fn test_verbosity_is_not_configurable() {
        let args = LogArgs {
            verbosity: 2,
            json: true,
            ..Default::default()
        };
        let value = serde_json::to_value(&args).unwrap();
        assert_eq!(value, serde_json::json!({"quiet": false, "json": true}));

        let parsed: LogArgs = serde_json::from_str(r#"{"verbosity": 2}"#).unwrap();
        assert_eq!(parsed.verbosity, 0);
    }
}
