//! Ledger manifest
//!
//! A small JSON document stored beside the journal. It pins the parameters
//! fixed at ledger construction so a reopened journal cannot silently change
//! its owner or threshold.

use crate::ledger::{Identity, SchemaVersion};
use crate::storage::error::{StorageError, StorageResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Construction parameters persisted with a journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub schema: SchemaVersion,
    pub owner: Identity,
    pub low_stock_threshold: u64,
    /// Unix seconds when the ledger was first created
    pub created_at: i64,
}

impl Manifest {
    pub fn new(owner: Identity, low_stock_threshold: u64) -> Self {
        Self {
            schema: SchemaVersion::CURRENT,
            owner,
            low_stock_threshold,
            created_at: Utc::now().timestamp(),
        }
    }

    /// Load from JSON file, `None` if it does not exist yet
    pub fn load(path: &Path) -> StorageResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        let manifest: Manifest = serde_json::from_str(&content)?;
        Ok(Some(manifest))
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check that `requested` describes the same ledger as this stored manifest
    pub fn ensure_matches(&self, requested: &Manifest) -> StorageResult<()> {
        if self.schema != requested.schema {
            return Err(StorageError::ManifestMismatch {
                field: "schema",
                stored: self.schema.to_string(),
                requested: requested.schema.to_string(),
            });
        }
        if self.owner != requested.owner {
            return Err(StorageError::ManifestMismatch {
                field: "owner",
                stored: self.owner.to_string(),
                requested: requested.owner.to_string(),
            });
        }
        if self.low_stock_threshold != requested.low_stock_threshold {
            return Err(StorageError::ManifestMismatch {
                field: "low_stock_threshold",
                stored: self.low_stock_threshold.to_string(),
                requested: requested.low_stock_threshold.to_string(),
            });
        }
        Ok(())
    }

    /// Return the stored manifest after validating it, or write `requested`
    pub fn load_or_create(path: &Path, requested: Manifest) -> StorageResult<Self> {
        match Self::load(path)? {
            Some(stored) => {
                stored.ensure_matches(&requested)?;
                Ok(stored)
            }
            None => {
                requested.save(path)?;
                tracing::info!(path = ?path, owner = %requested.owner, "Created ledger manifest");
                Ok(requested)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_then_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("meta").join("manifest.json");

        let created = Manifest::load_or_create(&path, Manifest::new("gw".into(), 100)).unwrap();
        assert!(path.exists());

        let reloaded = Manifest::load_or_create(&path, Manifest::new("gw".into(), 100)).unwrap();
        assert_eq!(reloaded, created);
    }

    #[test]
    fn test_owner_mismatch_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("manifest.json");

        Manifest::load_or_create(&path, Manifest::new("gw".into(), 100)).unwrap();
        let result = Manifest::load_or_create(&path, Manifest::new("other".into(), 100));

        assert!(matches!(
            result,
            Err(StorageError::ManifestMismatch { field: "owner", .. })
        ));
    }

    #[test]
    fn test_threshold_mismatch_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("manifest.json");

        Manifest::load_or_create(&path, Manifest::new("gw".into(), 100)).unwrap();
        let result = Manifest::load_or_create(&path, Manifest::new("gw".into(), 250));

        assert!(matches!(
            result,
            Err(StorageError::ManifestMismatch {
                field: "low_stock_threshold",
                ..
            })
        ));
    }
}
