//! Logging configuration.

use eyre::{Result, eyre};
use tracing_subscriber::EnvFilter;

use crate::LogArgs;

/// Build the log filter from command line arguments.
///
/// Precedence:
/// 1. If `--quiet` is set, only errors are shown
/// 2. Otherwise, start with `RUST_LOG` if set, or the level the verbosity
///    flags select
/// 3. Apply any custom directives from `--log.filter`
pub fn build_filter(args: &LogArgs) -> EnvFilter {
    if args.quiet {
        return EnvFilter::new(args.base_level());
    }

    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.base_level()));

    for directive in args.filter.iter().flat_map(|f| f.split(',')) {
        match directive.parse() {
            Ok(d) => filter = filter.add_directive(d),
            Err(error) => eprintln!("Ignoring invalid log directive {directive:?}: {error}"),
        }
    }

    filter
}

/// Install the global tracing subscriber.
pub fn init_logging(args: &LogArgs) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(build_filter(args));

    if args.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
    .map_err(|e| eyre!("failed to install tracing subscriber: {e}"))
}
