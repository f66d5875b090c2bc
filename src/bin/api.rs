//! Chemledger API Server
//!
//! Run with: cargo run --bin chemledger-api
//!
//! # Configuration
//!
//! A TOML file is read from `CHEMLEDGER_CONFIG` when set, otherwise from the
//! first of `~/.config/chemledger/config.toml`, `/etc/chemledger/config.toml`
//! and `./config.toml` that exists. Environment variables override the file:
//! - `CHEMLEDGER_API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `CHEMLEDGER_API_PORT`: Port to listen on (default: 8090)
//! - `CHEMLEDGER_DATA_DIR`: Data directory
//! - `CHEMLEDGER_OWNER`: Identity allowed to append (default: sensor-gateway)
//! - `CHEMLEDGER_LOW_STOCK_THRESHOLD`: Alert threshold (default: 100)
//! - `CHEMLEDGER_LOG_LEVEL` / `CHEMLEDGER_LOG_FORMAT`: Logging
//! - `RUST_LOG`: Overrides the log filter entirely

use anyhow::Context;
use chemledger::alert::{BroadcastSink, EventSink, TracingSink};
use chemledger::api::{serve, AppState};
use chemledger::config::Config;
use chemledger::ledger::Ledger;
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::var("CHEMLEDGER_CONFIG") {
        Ok(path) => Config::load_with_env(&PathBuf::from(path))?,
        Err(_) => Config::load_default()?,
    };

    chemledger::logging::init(&config.logging).context("Failed to initialize logging")?;

    tracing::info!("Starting Chemledger API server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Data directory: {:?}", config.ledger.data_dir);
    tracing::info!(
        owner = %config.ledger.owner,
        threshold = config.ledger.low_stock_threshold,
        journal = config.ledger.journal_enabled,
        "Ledger configuration"
    );

    // Event sinks
    let events = BroadcastSink::new(config.api.event_buffer);
    let sinks: Vec<Arc<dyn EventSink>> = vec![Arc::new(events.clone()), Arc::new(TracingSink)];

    tracing::info!("Opening ledger...");
    let ledger = Arc::new(Ledger::open(&config.ledger, sinks).context("Failed to open ledger")?);
    tracing::info!(records = ledger.count(), "Ledger opened");

    let state = AppState::with_events(Arc::clone(&ledger), config.api.clone(), &events);

    // Run server
    serve(state, &config.api).await?;

    // Graceful shutdown
    tracing::info!("Flushing ledger journal...");
    ledger.sync().context("Failed to flush ledger")?;
    tracing::info!("Chemledger API server stopped");

    Ok(())
}
