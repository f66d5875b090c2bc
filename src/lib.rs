//! # Chemledger
//!
//! Append-only measurement ledger for chemical and inventory monitoring.
//! Readings from a single authorized writer are recorded in arrival order,
//! queried by time range and classification, averaged per field, and
//! checked against a low-stock threshold as they arrive.
//!
//! ## Features
//!
//! - **Owner-only writes**: One identity may append; everyone may read
//! - **Stable ordering**: Record `i` is always the `i`-th successful append
//! - **Exact aggregates**: Integer means with no overflow on large ranges
//! - **Alerts**: Low-inventory events emitted atomically with the append
//! - **Durability**: Optional checksummed journal, replayed on open
//! - **Real-time**: WebSocket streaming of ledger events
//!
//! ## Modules
//!
//! - [`ledger`]: Record types, the access gate and the ledger itself
//! - [`storage`]: Persistence backends (memory, journal) and the data-dir manifest
//! - [`alert`]: Event types, the low-stock rule and event sinks
//! - [`query`]: Read-side lookups and filters
//! - [`aggregate`]: Per-field averages and summaries
//! - [`api`]: REST API server with Axum
//! - [`websocket`]: Event streaming hub
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chemledger::aggregate::{AggregationEngine, Field};
//! use chemledger::ledger::{Identity, Ledger, RecordFields};
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ledger = Arc::new(Ledger::in_memory("sensor-gateway", 100));
//!     let owner = Identity::new("sensor-gateway");
//!
//!     ledger.append(&owner, RecordFields::new().timestamp(1_000).temperature(-4).stock(50))?;
//!     ledger.append(&owner, RecordFields::new().timestamp(2_000).temperature(-2).stock(500))?;
//!
//!     let aggregates = AggregationEngine::new(Arc::clone(&ledger));
//!     let mean = aggregates.average(Field::Temperature, 0, 3_000)?;
//!     println!("mean temperature: {}", mean);
//!
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod alert;
pub mod api;
pub mod config;
pub mod ledger;
pub mod logging;
pub mod query;
pub mod storage;
pub mod websocket;

// Re-export top-level types for convenience
pub use ledger::{
    Appended, Identity, Ledger, LedgerConfig, LedgerError, LedgerResult, LedgerStats,
    MeasurementRecord, RecordAction, RecordFields, RecordState, RecordView, SchemaVersion,
    TimeRange,
};

pub use storage::{JournalStore, Manifest, MemoryStore, RecordStore, StorageError, SyncMode};

pub use alert::{AlertEngine, BroadcastSink, EventSink, LedgerEvent, TracingSink};

pub use query::{IndexedRecord, QueryEngine, RecordFilter};

pub use aggregate::{AggregationEngine, Field, FieldSummary, FieldValue};

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use websocket::{
    websocket_handler, ClientMessage, ConnectionHub, HubConfig, HubError, ServerMessage,
};

pub use config::{Config, ConfigError, LoggingConfig};
