//! Remote object store adapter.
//!
//! Everything that talks to the bucket goes through the [`ObjectBackend`]
//! trait, so the pipeline and its tests never depend on a network. The
//! production implementation is [`S3Backend`]; tests use the recording
//! `MockObjectBackend`.
//!
//! [`RemoteMirror`] sits on top of a backend and is the only thing the
//! pipeline sees. Its operations never fail: transport errors are logged and
//! turned into `None`/`false`, because a missing mirror must never abort an
//! upload that has already been persisted.

mod s3;

pub use s3::S3Backend;

use crate::config::RemoteConfig;
use crate::naming;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Content type of every mirrored artifact.
pub const MIRROR_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Error, Debug)]
pub enum RemoteMirrorError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{operation} {key:?} failed: {message}")]
    Transport {
        operation: &'static str,
        key: String,
        message: String,
    },
    #[error("Object store unavailable: {0}")]
    Unavailable(String),
}

/// One entry of a bucket listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// One page of a bucket listing. `next` is the continuation token, if the
/// listing was truncated.
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    pub objects: Vec<ObjectSummary>,
    pub next: Option<String>,
}

/// Raw object store operations.
///
/// Implementations must be `Sync`: uploads run in parallel and share one
/// backend.
pub trait ObjectBackend: Send + Sync {
    fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), RemoteMirrorError>;

    fn get_object(&self, key: &str) -> Result<Vec<u8>, RemoteMirrorError>;

    fn delete_object(&self, key: &str) -> Result<(), RemoteMirrorError>;

    /// List one page of objects, starting after `continuation`.
    fn list_page(&self, continuation: Option<&str>) -> Result<ObjectPage, RemoteMirrorError>;

    /// Public URL of `key`. Pure, no request is made.
    fn public_url(&self, key: &str) -> String;
}

/// Aggregate usage of the bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BucketStats {
    pub object_count: u64,
    pub total_size_bytes: u64,
    /// Most recent modification across all objects.
    pub last_modified: Option<DateTime<Utc>>,
}

impl BucketStats {
    pub fn total_size_mb(&self) -> f64 {
        (self.total_size_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
    }

    fn add(&mut self, object: &ObjectSummary) {
        self.object_count += 1;
        self.total_size_bytes += object.size;
        self.last_modified = match (self.last_modified, object.last_modified) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }
}

/// Best-effort mirror of processed results into the object store.
#[derive(Clone)]
pub struct RemoteMirror {
    backend: Arc<dyn ObjectBackend>,
}

impl RemoteMirror {
    pub fn new(backend: Arc<dyn ObjectBackend>) -> Self {
        Self { backend }
    }

    /// Connect to the bucket described by `settings`.
    pub fn from_config(settings: &RemoteConfig) -> Result<Self, RemoteMirrorError> {
        Ok(Self::new(Arc::new(S3Backend::from_config(settings)?)))
    }

    pub fn backend(&self) -> &Arc<dyn ObjectBackend> {
        &self.backend
    }

    /// Deterministic key for a processed artifact.
    pub fn key_for(id: Uuid, filter_type: &str, extension: &str) -> String {
        naming::key_for(id, filter_type, extension)
    }

    /// Upload a local file under `key`. Returns the public URL on success.
    pub fn upload(&self, local_artifact: &Path, key: &str) -> Option<String> {
        let result = std::fs::read(local_artifact)
            .map_err(|source| RemoteMirrorError::Read {
                path: local_artifact.to_path_buf(),
                source,
            })
            .and_then(|bytes| self.try_upload_bytes(bytes, key));
        log_failure(result, key)
    }

    /// Upload in-memory bytes under `key`. Returns the public URL on success.
    pub fn upload_bytes(&self, bytes: Vec<u8>, key: &str) -> Option<String> {
        log_failure(self.try_upload_bytes(bytes, key), key)
    }

    fn try_upload_bytes(&self, bytes: Vec<u8>, key: &str) -> Result<String, RemoteMirrorError> {
        let size = bytes.len();
        self.backend.put_object(key, bytes, MIRROR_CONTENT_TYPE)?;
        let url = self.backend.public_url(key);
        debug!(key, size, %url, "mirrored object");
        Ok(url)
    }

    /// Delete `key`. Returns whether the delete succeeded.
    pub fn delete(&self, key: &str) -> bool {
        match self.backend.delete_object(key) {
            Ok(()) => {
                debug!(key, "deleted object");
                true
            }
            Err(e) => {
                warn!(key, error = %e, "remote delete failed");
                false
            }
        }
    }

    /// Count objects and bytes across every page of the listing.
    pub fn stats(&self) -> Option<BucketStats> {
        let mut stats = BucketStats::default();
        let mut token: Option<String> = None;
        loop {
            let page = match self.backend.list_page(token.as_deref()) {
                Ok(page) => page,
                Err(e) => {
                    warn!(error = %e, "bucket listing failed");
                    return None;
                }
            };
            page.objects.iter().for_each(|o| stats.add(o));
            match page.next {
                Some(next) => token = Some(next),
                None => return Some(stats),
            }
        }
    }
}

fn log_failure(result: Result<String, RemoteMirrorError>, key: &str) -> Option<String> {
    match result {
        Ok(url) => Some(url),
        Err(e) => {
            warn!(key, error = %e, "remote upload failed");
            None
        }
    }
}
