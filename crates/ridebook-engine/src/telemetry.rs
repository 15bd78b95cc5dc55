//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins over the configured filter, so a one-off
//! `RUST_LOG=trace` works without touching the config file.

use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "info,ridebook=debug,sqlx=warn";

/// Installs the global fmt subscriber.
///
/// Returns `false` if a subscriber was already installed (tests, embedders).
pub fn init_tracing(filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
