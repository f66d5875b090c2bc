//! Core ledger
//!
//! The ledger is an append-only sequence of measurement records addressed
//! by zero-based index. Only the owner identity may append; anyone may read.

mod engine;
mod error;
mod gate;
mod schema;
mod types;

pub use engine::{Appended, Ledger, LedgerConfig, LedgerStats};
pub use error::{LedgerError, LedgerResult};
pub use gate::AccessGate;
pub use schema::{ReadingV1, ReadingV2, RecordView, SchemaVersion};
pub use types::{
    Identity, MeasurementRecord, RecordAction, RecordFields, RecordState, TimeRange,
};
