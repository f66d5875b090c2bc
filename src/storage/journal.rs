//! Append-only record journal
//!
//! Every record is persisted here before the ledger makes it visible. The
//! journal is never truncated in normal operation; it is the ledger.
//!
//! Format per entry:
//! - length: u32 (4 bytes)
//! - data: [u8; length] (bincode-serialized MeasurementRecord)
//! - crc: u32 (4 bytes, CRC32 of length + data)
//!
//! On open, a torn or corrupt tail (for example from a crash mid-write) is
//! cut off so later appends land right after the last good entry.

use crate::ledger::MeasurementRecord;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::store::RecordStore;
use serde::Deserialize;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

/// Upper bound on a single serialized record
const MAX_ENTRY_LEN: usize = 1_000_000;

/// Sync strategy for journal writes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Fsync after every append (safest, slowest)
    EveryWrite,
    /// Fsync once enough bytes accumulate
    #[default]
    Batched,
    /// No fsync, rely on the OS
    None,
}

/// File-backed record store
pub struct JournalStore {
    file: File,
    path: PathBuf,
    /// Number of intact entries in the file
    entry_count: u64,
    /// Byte length covered by intact entries
    valid_len: u64,
    bytes_since_sync: usize,
    sync_mode: SyncMode,
    sync_threshold: usize,
}

impl JournalStore {
    /// Open or create a journal, discarding any damaged tail
    pub fn open(path: impl AsRef<Path>, sync_mode: SyncMode) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let (entry_count, valid_len) = Self::scan(&path)?;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;

        let file_len = file.metadata()?.len();
        if file_len > valid_len {
            tracing::warn!(
                path = ?path,
                entries = entry_count,
                discarded_bytes = file_len - valid_len,
                "Truncating damaged journal tail"
            );
            file.set_len(valid_len)?;
        }

        Ok(Self {
            file,
            path,
            entry_count,
            valid_len,
            bytes_since_sync: 0,
            sync_mode,
            sync_threshold: 64 * 1024,
        })
    }

    /// Count intact entries and the byte offset just past the last one
    fn scan(path: &Path) -> StorageResult<(u64, u64)> {
        if !path.exists() {
            return Ok((0, 0));
        }

        let mut reader = BufReader::new(File::open(path)?);
        let mut count = 0u64;
        let mut offset = 0u64;

        loop {
            match Self::read_entry_from(&mut reader) {
                Ok(Some((_, len))) => {
                    count += 1;
                    offset += len as u64;
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Journal damaged at entry {}: {}", count, e);
                    break;
                }
            }
        }

        Ok((count, offset))
    }

    /// Encode a record into a complete frame
    fn encode(record: &MeasurementRecord) -> StorageResult<Vec<u8>> {
        let data = bincode::serialize(record)?;
        if data.len() > MAX_ENTRY_LEN {
            return Err(StorageError::Journal(format!(
                "Entry length too large: {}",
                data.len()
            )));
        }

        let len = (data.len() as u32).to_le_bytes();
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&len);
        hasher.update(&data);
        let crc = hasher.finalize();

        let mut frame = Vec::with_capacity(8 + data.len());
        frame.extend_from_slice(&len);
        frame.extend_from_slice(&data);
        frame.extend_from_slice(&crc.to_le_bytes());
        Ok(frame)
    }

    /// Read a single entry, returning it with its frame length
    fn read_entry_from<R: Read>(reader: &mut R) -> StorageResult<Option<(MeasurementRecord, usize)>> {
        let mut len_buf = [0u8; 4];
        match reader.read_exact(&mut len_buf) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        let len = u32::from_le_bytes(len_buf) as usize;

        if len > MAX_ENTRY_LEN {
            return Err(StorageError::Journal(format!(
                "Entry length too large: {}",
                len
            )));
        }

        let mut data = vec![0u8; len];
        reader.read_exact(&mut data)?;

        let mut crc_buf = [0u8; 4];
        reader.read_exact(&mut crc_buf)?;
        let stored_crc = u32::from_le_bytes(crc_buf);

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&len_buf);
        hasher.update(&data);
        let computed_crc = hasher.finalize();

        if stored_crc != computed_crc {
            return Err(StorageError::Corruption(format!(
                "CRC mismatch: stored={}, computed={}",
                stored_crc, computed_crc
            )));
        }

        let record: MeasurementRecord = bincode::deserialize(&data)?;
        Ok(Some((record, 8 + len)))
    }

    /// Whether an append bringing unsynced bytes to `pending` must fsync
    fn needs_sync(&self, pending: usize) -> bool {
        match self.sync_mode {
            SyncMode::EveryWrite => true,
            SyncMode::Batched => pending >= self.sync_threshold,
            SyncMode::None => false,
        }
    }

    /// Cut the file back to the last intact entry after a failed write
    fn rollback(&mut self) {
        if let Err(e) = self.file.set_len(self.valid_len) {
            tracing::error!(path = ?self.path, error = %e, "Failed to roll back partial journal write");
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_size(&self) -> u64 {
        self.valid_len
    }
}

impl RecordStore for JournalStore {
    fn load(&mut self) -> StorageResult<Vec<MeasurementRecord>> {
        let mut reader = BufReader::new(File::open(&self.path)?);
        let mut records = Vec::with_capacity(self.entry_count as usize);

        while (records.len() as u64) < self.entry_count {
            match Self::read_entry_from(&mut reader)? {
                Some((record, _)) => records.push(record),
                None => {
                    return Err(StorageError::Journal(format!(
                        "Journal ended after {} of {} entries",
                        records.len(),
                        self.entry_count
                    )))
                }
            }
        }

        Ok(records)
    }

    fn append(&mut self, record: &MeasurementRecord) -> StorageResult<()> {
        let frame = Self::encode(record)?;

        let pending = self.bytes_since_sync + frame.len();
        let sync = self.needs_sync(pending);

        // The entry only counts once it is written and, if required, synced
        let written = self
            .file
            .write_all(&frame)
            .and_then(|_| self.file.flush())
            .and_then(|_| if sync { self.file.sync_data() } else { Ok(()) });
        if let Err(e) = written {
            self.rollback();
            return Err(e.into());
        }

        self.valid_len += frame.len() as u64;
        self.entry_count += 1;
        self.bytes_since_sync = if sync { 0 } else { pending };
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.file.sync_data()?;
        self.bytes_since_sync = 0;
        Ok(())
    }

    fn entry_count(&self) -> u64 {
        self.entry_count
    }

    fn is_durable(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Identity, RecordFields};
    use std::io::{Seek, SeekFrom};
    use tempfile::tempdir;

    fn record(ts: i64, stock: u64) -> MeasurementRecord {
        MeasurementRecord::from_fields(
            RecordFields::new().timestamp(ts).stock(stock),
            Identity::new("gateway"),
            0,
        )
    }

    #[test]
    fn test_journal_append_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.journal");

        {
            let mut journal = JournalStore::open(&path, SyncMode::EveryWrite).unwrap();
            journal.append(&record(1000, 50)).unwrap();
            journal.append(&record(2000, 500)).unwrap();
            assert_eq!(journal.entry_count(), 2);
        }

        let mut journal = JournalStore::open(&path, SyncMode::EveryWrite).unwrap();
        let records = journal.load().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].timestamp, 1000);
        assert_eq!(records[0].available_stock, 50);
        assert_eq!(records[1].timestamp, 2000);
    }

    #[test]
    fn test_journal_persistence_across_opens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.journal");

        for session in 0..3 {
            let mut journal = JournalStore::open(&path, SyncMode::Batched).unwrap();
            assert_eq!(journal.entry_count(), session * 5);
            for i in 0..5 {
                journal.append(&record((session * 5 + i) as i64, 10)).unwrap();
            }
            journal.sync().unwrap();
        }

        let mut journal = JournalStore::open(&path, SyncMode::None).unwrap();
        let records = journal.load().unwrap();
        assert_eq!(records.len(), 15);
        for (i, r) in records.iter().enumerate() {
            assert_eq!(r.timestamp, i as i64);
        }
    }

    #[test]
    fn test_torn_tail_is_truncated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.journal");

        let good_len = {
            let mut journal = JournalStore::open(&path, SyncMode::EveryWrite).unwrap();
            journal.append(&record(1, 1)).unwrap();
            journal.append(&record(2, 2)).unwrap();
            journal.file_size()
        };

        // Simulate a crash halfway through a third frame
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(&[40, 0, 0, 0, 1, 2, 3]).unwrap();
        }

        let mut journal = JournalStore::open(&path, SyncMode::EveryWrite).unwrap();
        assert_eq!(journal.entry_count(), 2);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), good_len);

        journal.append(&record(3, 3)).unwrap();
        drop(journal);

        let mut journal = JournalStore::open(&path, SyncMode::EveryWrite).unwrap();
        let records = journal.load().unwrap();
        assert_eq!(
            records.iter().map(|r| r.timestamp).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_crc_corruption_stops_recovery() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.journal");

        {
            let mut journal = JournalStore::open(&path, SyncMode::EveryWrite).unwrap();
            journal.append(&record(1, 1)).unwrap();
        }

        {
            let mut file = OpenOptions::new().write(true).open(&path).unwrap();
            file.seek(SeekFrom::Start(10)).unwrap();
            file.write_all(&[0xFF, 0xFF]).unwrap();
        }

        let mut journal = JournalStore::open(&path, SyncMode::EveryWrite).unwrap();
        assert_eq!(journal.entry_count(), 0);
        assert!(journal.load().unwrap().is_empty());
    }

    #[test]
    fn test_integrity_tag_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.journal");

        let tagged = MeasurementRecord::from_fields(
            RecordFields::new().timestamp(7).integrity_tag("0xdeadbeef"),
            Identity::new("gateway"),
            0,
        );

        let mut journal = JournalStore::open(&path, SyncMode::EveryWrite).unwrap();
        journal.append(&tagged).unwrap();

        let records = journal.load().unwrap();
        assert_eq!(records[0].integrity_tag.as_deref(), Some("0xdeadbeef"));
    }

    #[test]
    fn test_rollback_discards_partial_frame() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.journal");

        let mut journal = JournalStore::open(&path, SyncMode::EveryWrite).unwrap();
        journal.append(&record(1, 1)).unwrap();
        let good_len = journal.file_size();

        // Half a frame left behind by an interrupted write
        journal.file.write_all(&[40, 0, 0, 0, 9, 9]).unwrap();
        journal.rollback();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), good_len);

        journal.append(&record(2, 2)).unwrap();
        drop(journal);

        let mut journal = JournalStore::open(&path, SyncMode::EveryWrite).unwrap();
        let records = journal.load().unwrap();
        assert_eq!(records.iter().map(|r| r.timestamp).collect::<Vec<_>>(), vec![1, 2]);
    }

    // /dev/full fails every write with ENOSPC
    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_write_is_not_counted() {
        let mut journal = JournalStore::open("/dev/full", SyncMode::None).unwrap();

        assert!(journal.append(&record(1, 1)).is_err());
        assert_eq!(journal.entry_count(), 0);
        assert_eq!(journal.file_size(), 0);
    }

    // /dev/null accepts writes but rejects fsync
    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_sync_is_not_counted() {
        let mut journal = JournalStore::open("/dev/null", SyncMode::EveryWrite).unwrap();

        assert!(journal.append(&record(1, 1)).is_err());
        assert_eq!(journal.entry_count(), 0);
        assert_eq!(journal.file_size(), 0);
    }

    #[test]
    fn test_batched_sync_tracks_pending_bytes() {
        let dir = tempdir().unwrap();
        let mut journal =
            JournalStore::open(dir.path().join("records.journal"), SyncMode::Batched).unwrap();
        journal.sync_threshold = 1;

        journal.append(&record(1, 1)).unwrap();
        assert_eq!(journal.bytes_since_sync, 0);

        journal.sync_mode = SyncMode::None;
        journal.append(&record(2, 2)).unwrap();
        assert!(journal.bytes_since_sync > 0);
    }
}
