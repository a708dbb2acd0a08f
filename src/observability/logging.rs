//! Structured logging setup for the binaries.
//!
//! The library itself only emits `tracing` events; installing a subscriber
//! is left to the host application.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter: `RUST_LOG` wins, otherwise `level` for this crate.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("http_telemetry={level},tower_http={level}").into())
}

/// Install a global fmt subscriber. Safe to call more than once.
pub fn init(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(env_filter(level))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
