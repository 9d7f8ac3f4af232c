/// Logging setup
///
/// Installs the tracing subscriber used by the service binary.

use tracing_subscriber::EnvFilter;

/// Default filter when `KD_LOG` is unset
pub const DEFAULT_FILTER: &str = "hw_keyword_detector=info";

/// Install the fmt subscriber, filtered by `KD_LOG`
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place.
pub fn init() {
    let filter = EnvFilter::try_from_env("KD_LOG")
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
