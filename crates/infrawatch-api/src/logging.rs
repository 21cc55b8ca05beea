//! Tracing subscriber setup for `infrawatchd`.
//!
//! Filter priority: `INFRAWATCH_LOG`, then `RUST_LOG`, then `info`.
//! Output goes to stderr so stdout stays free for tooling.

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "info";

/// Installs the global subscriber. Returns `false` if one was already set.
pub fn init_tracing() -> bool {
    let stderr_is_tty = std::io::IsTerminal::is_terminal(&std::io::stderr());
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(stderr_is_tty)
        .with_target(true);

    tracing_subscriber::registry()
        .with(build_env_filter())
        .with(fmt_layer)
        .try_init()
        .is_ok()
}

fn build_env_filter() -> EnvFilter {
    // An unparseable project filter falls through to RUST_LOG.
    if let Ok(directives) = std::env::var("INFRAWATCH_LOG") {
        if let Ok(filter) = EnvFilter::try_new(&directives) {
            return filter;
        }
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}
