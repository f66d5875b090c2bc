//! Storage backend error types
//!
//! Defines all errors that can occur while persisting or recovering records.

use thiserror::Error;

/// Errors that can occur in a record store
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Data corruption detected (checksum mismatch, oversized entry, etc.)
    #[error("Corrupt data: {0}")]
    Corruption(String),

    /// Journal format or recovery error
    #[error("Journal error: {0}")]
    Journal(String),

    /// Existing manifest disagrees with the requested ledger parameters
    #[error("Manifest mismatch for {field}: stored {stored}, requested {requested}")]
    ManifestMismatch {
        field: &'static str,
        stored: String,
        requested: String,
    },
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
