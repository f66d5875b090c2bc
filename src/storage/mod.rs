//! Persistence backends for the measurement ledger
//!
//! - **store**: The `RecordStore` trait and the in-memory store
//! - **journal**: Append-only CRC-framed record journal
//! - **manifest**: Owner/threshold manifest stored beside the journal
//! - **error**: Error types
//!
//! # Layout
//!
//! ```text
//! <data_dir>/
//!   journal/records.journal   length | bincode record | crc32, repeated
//!   meta/manifest.json        schema, owner, threshold
//! ```

pub mod error;
pub mod journal;
pub mod manifest;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use journal::{JournalStore, SyncMode};
pub use manifest::Manifest;
pub use store::{MemoryStore, RecordStore};
