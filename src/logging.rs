//! Logging setup
//!
//! Installs a global `tracing` subscriber. `RUST_LOG` takes precedence over
//! the configured level when set.

use crate::config::LoggingConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter directive for a configured level
pub fn default_directive(level: &str) -> String {
    format!("chemledger={level},tower_http=info")
}

/// Install the global subscriber
///
/// Fails if a subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&config.level)));

    let registry = tracing_subscriber::registry().with(filter);

    match config.format.as_str() {
        "json" => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .try_init(),
        _ => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
    }
}
