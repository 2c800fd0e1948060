//! Logging setup for the Slim CLI.
//!
//! `--verbose` turns on debug output for the slim crates, `--quiet` keeps
//! errors only, and otherwise `RUST_LOG` is honored with `info` as fallback.
//!
//! ```rust,no_run
//! use slim_cli::logger::init_logger;
//! use tracing::info;
//!
//! init_logger(false, false, false);
//! info!("Probing application");
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const VERBOSE_FILTER: &str = "slim_cli=debug,slim_loader=debug,slim_optimize=debug";
const QUIET_FILTER: &str = "slim_cli=error,slim_loader=error,slim_optimize=error";
const DEFAULT_FILTER: &str = "slim_cli=info,slim_loader=info,slim_optimize=info";

/// Initialize the global tracing subscriber.
///
/// Must be called once, before anything logs. `verbose` wins over `quiet`,
/// and either flag wins over `RUST_LOG`.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    init_logger_with_filter(filter_for(verbose, quiet), no_color);
}

/// Initialize the subscriber with an explicit filter.
pub fn init_logger_with_filter(filter: EnvFilter, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}
