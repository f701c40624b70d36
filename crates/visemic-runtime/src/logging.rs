//! Logging setup

use tracing_subscriber::{fmt, EnvFilter};

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (e.g. `"visemic=info"`).
///
/// Returns false if a global subscriber was already set.
pub fn init_logging(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    fmt()
        .with_target(true)
        .with_thread_ids(false)
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}
