//! Record store abstraction
//!
//! The ledger keeps its records in memory and hands each new one to a
//! `RecordStore` before making it visible. Stores decide how (and whether)
//! records survive a restart.

use crate::ledger::MeasurementRecord;
use crate::storage::error::StorageResult;

/// Persistence backend for ledger records
pub trait RecordStore: Send {
    /// Read back every record persisted so far, in append order
    fn load(&mut self) -> StorageResult<Vec<MeasurementRecord>>;

    /// Persist one record; on error nothing must be considered stored
    fn append(&mut self, record: &MeasurementRecord) -> StorageResult<()>;

    /// Force buffered data to stable storage
    fn sync(&mut self) -> StorageResult<()>;

    /// Number of records the store holds
    fn entry_count(&self) -> u64;

    fn is_durable(&self) -> bool {
        false
    }
}

/// Store that keeps nothing; records live only as long as the ledger
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn load(&mut self) -> StorageResult<Vec<MeasurementRecord>> {
        Ok(Vec::new())
    }

    fn append(&mut self, _record: &MeasurementRecord) -> StorageResult<()> {
        self.entries += 1;
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn entry_count(&self) -> u64 {
        self.entries
    }
}
