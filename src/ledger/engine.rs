//! The measurement ledger
//!
//! Orchestrates the write path and owns the record sequence:
//! - Write path: caller → AccessGate → RecordStore → records → AlertEngine → sinks
//! - Read path: snapshot under a read guard, no gate
//!
//! Appends are serialized by the store mutex. The record vector sits behind
//! a reader-writer lock, so every read sees a fixed prefix of the ledger for
//! its whole duration. Events are published after the new record is visible
//! and before the next append can start.

use crate::alert::{AlertEngine, EventSink, LedgerEvent, DEFAULT_LOW_STOCK_THRESHOLD};
use crate::ledger::error::{LedgerError, LedgerResult};
use crate::ledger::gate::AccessGate;
use crate::ledger::schema::{RecordView, SchemaVersion};
use crate::ledger::types::{Identity, MeasurementRecord, RecordFields};
use crate::storage::{JournalStore, Manifest, MemoryStore, RecordStore, SyncMode};
use chrono::Utc;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Construction parameters for a ledger
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Sole identity allowed to append
    #[serde(default = "default_owner")]
    pub owner: Identity,
    /// Stock level below which alerts fire
    #[serde(default = "default_threshold")]
    pub low_stock_threshold: u64,
    /// Root directory for the journal and manifest
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Persist records to the journal (otherwise memory only)
    #[serde(default = "default_journal_enabled")]
    pub journal_enabled: bool,
    /// Journal fsync strategy
    #[serde(default)]
    pub sync_mode: SyncMode,
}

fn default_owner() -> Identity {
    Identity::new("sensor-gateway")
}

fn default_threshold() -> u64 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|p| p.join("chemledger"))
        .unwrap_or_else(|| PathBuf::from("chemledger_data"))
}

fn default_journal_enabled() -> bool {
    true
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            low_stock_threshold: default_threshold(),
            data_dir: default_data_dir(),
            journal_enabled: default_journal_enabled(),
            sync_mode: SyncMode::default(),
        }
    }
}

impl LedgerConfig {
    pub fn new(owner: impl Into<Identity>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            owner: owner.into(),
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Builder: set the low-stock threshold
    pub fn threshold(mut self, threshold: u64) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    /// Get path to the record journal
    pub fn journal_path(&self) -> PathBuf {
        self.data_dir.join("journal").join("records.journal")
    }

    /// Get path to the manifest file
    pub fn manifest_path(&self) -> PathBuf {
        self.data_dir.join("meta").join("manifest.json")
    }
}

/// Result of a successful append
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appended {
    pub index: usize,
    pub record: MeasurementRecord,
    pub events: Vec<LedgerEvent>,
}

impl Appended {
    pub fn low_inventory(&self) -> bool {
        self.events.iter().any(LedgerEvent::is_alert)
    }
}

/// Append-only, index-addressable sequence of measurement records
pub struct Ledger {
    gate: AccessGate,
    alerts: AlertEngine,
    records: RwLock<Vec<MeasurementRecord>>,
    /// Also the append serializer
    store: Mutex<Box<dyn RecordStore>>,
}

impl Ledger {
    /// Create a ledger over `store`, replaying whatever it already holds
    pub fn new(
        owner: Identity,
        alerts: AlertEngine,
        mut store: Box<dyn RecordStore>,
    ) -> LedgerResult<Self> {
        let records = store.load()?;
        if !records.is_empty() {
            tracing::info!("Recovered {} records from store", records.len());
        }

        Ok(Self {
            gate: AccessGate::new(owner),
            alerts,
            records: RwLock::new(records),
            store: Mutex::new(store),
        })
    }

    /// Ledger with no persistence and no sinks
    pub fn in_memory(owner: impl Into<Identity>, threshold: u64) -> Self {
        Self {
            gate: AccessGate::new(owner.into()),
            alerts: AlertEngine::new(threshold),
            records: RwLock::new(Vec::new()),
            store: Mutex::new(Box::new(MemoryStore::new())),
        }
    }

    /// Open a ledger from configuration, attaching `sinks` to its alert engine
    pub fn open(config: &LedgerConfig, sinks: Vec<Arc<dyn EventSink>>) -> LedgerResult<Self> {
        let alerts = sinks
            .into_iter()
            .fold(AlertEngine::new(config.low_stock_threshold), |engine, sink| {
                engine.with_sink(sink)
            });

        let store: Box<dyn RecordStore> = if config.journal_enabled {
            Manifest::load_or_create(
                &config.manifest_path(),
                Manifest::new(config.owner.clone(), config.low_stock_threshold),
            )?;
            Box::new(JournalStore::open(config.journal_path(), config.sync_mode)?)
        } else {
            Box::new(MemoryStore::new())
        };

        let ledger = Self::new(config.owner.clone(), alerts, store)?;
        tracing::info!(
            owner = %config.owner,
            threshold = config.low_stock_threshold,
            records = ledger.count(),
            durable = config.journal_enabled,
            "Ledger opened"
        );
        Ok(ledger)
    }

    // The vector is only ever pushed to, so a panicked holder cannot leave
    // it inconsistent and poisoning is safe to ignore.
    fn read_records(&self) -> RwLockReadGuard<'_, Vec<MeasurementRecord>> {
        self.records.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_records(&self) -> RwLockWriteGuard<'_, Vec<MeasurementRecord>> {
        self.records.write().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_store(&self) -> LedgerResult<MutexGuard<'_, Box<dyn RecordStore>>> {
        self.store
            .lock()
            .map_err(|e| LedgerError::Lock(format!("Failed to acquire store lock: {}", e)))
    }

    /// Append a record on behalf of `caller`, returning its index
    pub fn append(&self, caller: &Identity, fields: RecordFields) -> LedgerResult<usize> {
        self.append_record(caller, fields).map(|appended| appended.index)
    }

    /// Append a record and return it together with the events it produced
    pub fn append_record(&self, caller: &Identity, fields: RecordFields) -> LedgerResult<Appended> {
        self.gate.authorize(caller)?;

        let mut store = self.lock_store()?;

        let record = MeasurementRecord::from_fields(fields, caller.clone(), Utc::now().timestamp());

        if let Err(e) = store.append(&record) {
            tracing::error!(error = %e, "Failed to persist record, append aborted");
            return Err(e.into());
        }

        let index = {
            let mut records = self.write_records();
            records.push(record.clone());
            records.len() - 1
        };

        tracing::debug!(
            index,
            timestamp = record.timestamp,
            source = %record.source,
            stock = record.available_stock,
            "Appended record"
        );

        let events = self.alerts.on_append(&record, index);
        drop(store);

        Ok(Appended {
            index,
            record,
            events,
        })
    }

    /// Current number of records
    pub fn count(&self) -> usize {
        self.read_records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Record at `index`, `OutOfBounds` if `index >= count()`
    pub fn get(&self, index: usize) -> LedgerResult<MeasurementRecord> {
        let records = self.read_records();
        records
            .get(index)
            .cloned()
            .ok_or(LedgerError::OutOfBounds {
                index,
                count: records.len(),
            })
    }

    /// Leading `min(n, count())` records in ledger order
    pub fn first(&self, n: usize) -> Vec<MeasurementRecord> {
        let records = self.read_records();
        records[..n.min(records.len())].to_vec()
    }

    /// Trailing `min(n, count())` records in ledger order
    pub fn last(&self, n: usize) -> Vec<MeasurementRecord> {
        let records = self.read_records();
        let start = records.len().saturating_sub(n);
        records[start..].to_vec()
    }

    /// Run `f` over a consistent snapshot of the records
    ///
    /// Appends wait until `f` returns, so keep it to a scan.
    pub fn read<R>(&self, f: impl FnOnce(&[MeasurementRecord]) -> R) -> R {
        let records = self.read_records();
        f(&records)
    }

    /// Owned copy of every record at this instant
    pub fn snapshot(&self) -> Vec<MeasurementRecord> {
        self.read(|records| records.to_vec())
    }

    /// Record at `index` projected onto an older schema
    pub fn view(&self, index: usize, schema: SchemaVersion) -> LedgerResult<RecordView> {
        self.get(index)
            .map(|record| RecordView::project(&record, schema))
    }

    pub fn owner(&self) -> &Identity {
        self.gate.owner()
    }

    pub fn is_owner(&self, caller: &Identity) -> bool {
        self.gate.is_owner(caller)
    }

    pub fn threshold(&self) -> u64 {
        self.alerts.threshold()
    }

    /// Force the store to stable storage
    pub fn sync(&self) -> LedgerResult<()> {
        self.lock_store()?.sync()?;
        Ok(())
    }

    pub fn stats(&self) -> LedgerResult<LedgerStats> {
        let store = self.lock_store()?;
        let threshold = self.threshold();
        let (records, low_stock_records) = self.read(|records| {
            (
                records.len(),
                records.iter().filter(|r| r.is_low_stock(threshold)).count(),
            )
        });

        Ok(LedgerStats {
            records,
            low_stock_records,
            persisted_entries: store.entry_count(),
            durable: store.is_durable(),
            owner: self.owner().clone(),
            threshold,
        })
    }
}

/// Ledger statistics
#[derive(Debug, Clone)]
pub struct LedgerStats {
    pub records: usize,
    pub low_stock_records: usize,
    pub persisted_entries: u64,
    pub durable: bool,
    pub owner: Identity,
    pub threshold: u64,
}

impl std::fmt::Display for LedgerStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Records: {}, Low stock: {}, Persisted: {}, Durable: {}, Owner: {}, Threshold: {}",
            self.records,
            self.low_stock_records,
            self.persisted_entries,
            self.durable,
            self.owner,
            self.threshold
        )
    }
}
