//! Logging setup shared by the binaries.

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `fallback_filter` (usually from
/// [`SandboxConfig::log_filter`](crate::config::SandboxConfig)) is used.
/// Calling this twice is harmless: the second install is ignored.
pub fn init_tracing(fallback_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
