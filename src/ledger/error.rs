//! Ledger error types
//!
//! Defines every error a ledger operation can return to its caller.

use crate::ledger::types::Identity;
use crate::storage::StorageError;
use thiserror::Error;

/// Errors that can occur in ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Caller is not the ledger owner; nothing was written
    #[error("Unauthorized: {caller} is not permitted to append")]
    Unauthorized { caller: Identity },

    /// Index is not below the current record count
    #[error("Index {index} out of bounds (count: {count})")]
    OutOfBounds { index: usize, count: usize },

    /// Time range with start after end
    #[error("Invalid time range: start {start} is after end {end}")]
    InvalidRange { start: i64, end: i64 },

    /// Aggregation over a filter that matched no records
    #[error("No data: no records match the requested filter")]
    NoData,

    /// Unrecognized name for a state, action, field or schema
    #[error("Unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },

    /// Backing store failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Lock acquisition failed
    #[error("Lock error: {0}")]
    Lock(String),
}

/// Result type alias for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
