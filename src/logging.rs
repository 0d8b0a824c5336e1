//! Tracing subscriber setup for binaries and examples.

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber.
///
/// Filter comes from `RUST_LOG`, falling back to `default_filter`.
/// Calling this twice is harmless: the second install is ignored.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .try_init();
}
