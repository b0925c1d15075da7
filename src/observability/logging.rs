//! Structured logging.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter: `RUST_LOG` if set, otherwise `level` for this crate
/// and the HTTP middleware.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("file_relay={level},tower_http={level}").into())
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init(level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
