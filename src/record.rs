//! The `ProcessedImage` record and where records are kept.
//!
//! A record is created once per upload, with the original already stored
//! and its metadata filled in, then updated in place when the processed
//! result (and optionally its remote URL) become available. Records are
//! never deleted here.

use crate::imaging::Filter;
use crate::storage::{BlobRef, PersistenceError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedImage {
    pub id: Uuid,
    pub original_filename: String,
    pub original_blob_ref: BlobRef,
    /// Set once the filter result has been persisted.
    pub processed_blob_ref: Option<BlobRef>,
    pub filter_type: Filter,
    /// Set only when remote mirroring succeeded.
    pub remote_url: Option<String>,
    pub file_size: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Hex SHA-256 of the uploaded bytes.
    pub original_sha256: String,
    pub created_at: DateTime<Utc>,
}

impl ProcessedImage {
    /// Upload size in MiB, rounded to two decimals.
    pub fn file_size_mb(&self) -> Option<f64> {
        self.file_size
            .map(|bytes| (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0)
    }

    pub fn is_processed(&self) -> bool {
        self.processed_blob_ref.is_some()
    }
}

pub trait RecordStore: Send + Sync {
    /// Insert a new record. Fails if the id already exists.
    fn create(&self, record: &ProcessedImage) -> Result<(), PersistenceError>;

    /// Replace an existing record.
    fn update(&self, record: &ProcessedImage) -> Result<(), PersistenceError>;

    fn get(&self, id: Uuid) -> Result<Option<ProcessedImage>, PersistenceError>;
}

/// One pretty-printed JSON file per record: `{records_dir}/{id}.json`.
#[derive(Debug, Clone)]
pub struct JsonRecordStore {
    dir: PathBuf,
}

impl JsonRecordStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Atomic write via a staging file. With `clobber` off an existing
    /// record is never replaced.
    fn write(&self, record: &ProcessedImage, clobber: bool) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir).map_err(|e| PersistenceError::io(&self.dir, e))?;
        let json = serde_json::to_string_pretty(record)?;
        let target = self.path_for(record.id);
        let mut staging =
            NamedTempFile::new_in(&self.dir).map_err(|e| PersistenceError::io(&self.dir, e))?;
        staging
            .write_all(json.as_bytes())
            .map_err(|e| PersistenceError::io(staging.path(), e))?;
        let persisted = if clobber {
            staging.persist(&target)
        } else {
            staging.persist_noclobber(&target)
        };
        persisted.map_err(|e| PersistenceError::io(&target, e.error))?;
        Ok(())
    }
}

impl RecordStore for JsonRecordStore {
    fn create(&self, record: &ProcessedImage) -> Result<(), PersistenceError> {
        self.write(record, false)
    }

    fn update(&self, record: &ProcessedImage) -> Result<(), PersistenceError> {
        if !self.path_for(record.id).exists() {
            return Err(PersistenceError::NotFound(record.id.to_string()));
        }
        self.write(record, true)
    }

    fn get(&self, id: Uuid) -> Result<Option<ProcessedImage>, PersistenceError> {
        let path = self.path_for(id);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PersistenceError::io(path, e)),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }
}
