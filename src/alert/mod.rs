//! Append notifications
//!
//! - **events**: `RecordCreated` and `LowInventoryAlert`
//! - **engine**: Threshold check and dispatch on every append
//! - **sink**: The `EventSink` trait plus broadcast and tracing sinks
//!
//! ```text
//! append ─► AlertEngine::on_append ─► RecordCreated ─┬─► sink 1
//!                                  └► LowInventory? ─┴─► sink N
//! ```

mod engine;
mod events;
mod sink;

pub use engine::{AlertEngine, DEFAULT_LOW_STOCK_THRESHOLD};
pub use events::LedgerEvent;
pub use sink::{BroadcastSink, EventSink, TracingSink};
