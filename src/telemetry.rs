//! Tracing subscriber setup for binaries and long-running test harnesses.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level, so an operator can raise
/// verbosity per module without touching config files. Safe to call more
/// than once; later calls are no-ops.
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
