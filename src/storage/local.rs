//! Filesystem-backed primary store.

use super::{BlobRef, Location, PersistenceError, PrimaryStore, validate_path_hint};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Blobs live under `media_root` and are served from `media_url`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    media_root: PathBuf,
    media_url: String,
}

impl LocalStore {
    pub fn new(media_root: &Path, media_url: &str) -> Self {
        Self {
            media_root: media_root.to_path_buf(),
            media_url: media_url.to_string(),
        }
    }

    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    /// Absolute filesystem path of a blob.
    pub fn path(&self, blob: &BlobRef) -> PathBuf {
        self.media_root.join(blob.as_str())
    }

    /// URL of a blob under `media_url`.
    pub fn url(&self, blob: &BlobRef) -> String {
        format!("{}/{}", self.media_url.trim_end_matches('/'), blob.as_str())
    }
}

impl PrimaryStore for LocalStore {
    /// Writes go to a sibling temp file first and are renamed into place, so
    /// a reader never sees a half-written blob.
    fn save(&self, blob: &[u8], path_hint: &str) -> Result<BlobRef, PersistenceError> {
        validate_path_hint(path_hint)?;
        let target = self.media_root.join(path_hint);
        let parent = target
            .parent()
            .ok_or_else(|| PersistenceError::InvalidPath(path_hint.to_string()))?;
        fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;

        let mut staging = NamedTempFile::new_in(parent).map_err(|e| PersistenceError::io(parent, e))?;
        staging
            .write_all(blob)
            .map_err(|e| PersistenceError::io(staging.path(), e))?;
        staging
            .persist(&target)
            .map_err(|e| PersistenceError::io(&target, e.error))?;
        Ok(BlobRef::new(path_hint))
    }

    fn read(&self, blob: &BlobRef) -> Result<Vec<u8>, PersistenceError> {
        let path = self.path(blob);
        fs::read(&path).map_err(|e| PersistenceError::io(path, e))
    }

    fn path_or_url(&self, blob: &BlobRef) -> Location {
        Location::Path(self.path(blob))
    }
}
