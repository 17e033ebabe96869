//! Telemetry helpers for structured logging and tracing.

use tracing_subscriber::EnvFilter;

/// Environment variable consulted first for the log filter.
pub const LOG_FILTER_ENV: &str = "OBJECT_POOL_LOG";

/// Install a default fmt subscriber unless the host already set one.
///
/// The filter comes from `OBJECT_POOL_LOG`, then `RUST_LOG`, then `info`.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
