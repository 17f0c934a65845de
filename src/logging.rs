//! Diagnostic logging on stderr.
//!
//! Command output goes to stdout; everything here goes to stderr so it can
//! never corrupt `--get` or `--list` output. The filter comes from
//! `INIGUARD_LOG`, then `RUST_LOG`, then the verbosity flag.

use std::io::IsTerminal;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding an `EnvFilter` directive.
pub const ENV_LOG: &str = "INIGUARD_LOG";

/// Filter used when no environment variable is set.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "iniguard=debug,iniguard_schema=debug"
    } else {
        "warn"
    }
}

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(ENV_LOG)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(verbose: bool) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .without_time();

    let _ = tracing_subscriber::registry()
        .with(filter(verbose))
        .with(fmt_layer)
        .try_init();
}
