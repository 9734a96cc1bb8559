//! `tracing` subscriber bootstrap.

use tracing_subscriber::EnvFilter;

/// Install a formatted `tracing` subscriber.
///
/// The `RUST_LOG` environment variable wins; `default_filter` applies when
/// it is unset (e.g. `"oplink=info"`). Safe to call more than once — later
/// calls are no-ops.
pub fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
