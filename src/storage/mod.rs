//! Primary storage for originals and processed results.
//!
//! A [`PrimaryStore`] turns bytes plus a relative path hint into a
//! [`BlobRef`], and later resolves that reference to either a filesystem
//! path ([`LocalStore`]) or a URL ([`BucketStore`]). The pipeline only ever
//! branches on [`Location`], never on the store type.

mod bucket;
mod local;

pub use bucket::BucketStore;
pub use local::LocalStore;

use crate::remote::RemoteMirrorError;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Invalid storage path {0:?}")]
    InvalidPath(String),
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Object store error: {0}")]
    Remote(#[from] RemoteMirrorError),
    #[error("Record {0} not found")]
    NotFound(String),
    #[error("Record serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Store-relative name of a saved blob, e.g.
/// `uploads/processed/processed_{id}_sepia.jpg`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobRef(String);

impl BlobRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a stored blob can be reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Path(PathBuf),
    Url(String),
}

pub trait PrimaryStore: Send + Sync {
    /// Persist `blob` under `path_hint` (relative, `/`-separated).
    fn save(&self, blob: &[u8], path_hint: &str) -> Result<BlobRef, PersistenceError>;

    fn read(&self, blob: &BlobRef) -> Result<Vec<u8>, PersistenceError>;

    fn path_or_url(&self, blob: &BlobRef) -> Location;
}

/// Reject hints that could escape the store root.
pub(crate) fn validate_path_hint(path_hint: &str) -> Result<(), PersistenceError> {
    let invalid = || PersistenceError::InvalidPath(path_hint.to_string());
    if path_hint.is_empty() || path_hint.contains('\\') {
        return Err(invalid());
    }
    let all_normal = Path::new(path_hint)
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if all_normal { Ok(()) } else { Err(invalid()) }
}

/// MIME type for a stored blob, from its extension.
pub fn content_type_for(path_hint: &str) -> &'static str {
    ImageFormat::from_path(path_hint)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream")
}
