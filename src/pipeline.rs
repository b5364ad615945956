//! One upload, end to end.
//!
//! ```text
//! raw bytes ─▶ resolve filter ─▶ decode ─▶ save original + create record
//!                                               │
//!            ┌──────────────────────────────────┘
//!            ▼
//!        transform ─▶ encode (scoped temp file) ─▶ save processed result
//!                                                        │
//!                              mirror (optional, never fatal) ◀┘
//!                                      │
//!                                      ▼
//!                               update record ─▶ UploadOutcome
//! ```
//!
//! Every step before mirroring is fatal: the first error stops the upload
//! and becomes a short user-facing message, while the full error is logged.
//! Mirroring failures are logged and leave `remote_url` unset.
//!
//! The filter is resolved before anything is written, so an unknown filter
//! never leaves a record behind. Metadata (dimensions, size, digest) goes
//! into the record in the same write that creates it.

use crate::config::{AppConfig, StorageBackend};
use crate::imaging::{self, DecodeError, EncodeError, Filter, Quality, UnsupportedFilterError};
use crate::naming::{self, PROCESSED_EXTENSION};
use crate::record::{JsonRecordStore, ProcessedImage, RecordStore};
use crate::remote::{RemoteMirror, S3Backend};
use crate::storage::{BlobRef, BucketStore, LocalStore, Location, PersistenceError, PrimaryStore};
use chrono::Utc;
use image::DynamicImage;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    UnsupportedFilter(#[from] UnsupportedFilterError),
    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("Persistence failed: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("Encode failed: {0}")]
    Encode(#[from] EncodeError),
}

impl PipelineError {
    /// Message safe to show the person who uploaded the image.
    pub fn user_message(&self) -> &'static str {
        match self {
            PipelineError::UnsupportedFilter(_) => "Unsupported filter selected.",
            PipelineError::Decode(_) => "The uploaded file is not a valid image.",
            PipelineError::Persistence(_) => "Could not save the image. Please try again.",
            PipelineError::Encode(_) => "Error processing image. Please try again.",
        }
    }
}

/// Result of one upload, as returned to the request layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    /// Present once a record exists, even if a later step failed.
    pub id: Option<Uuid>,
    pub success: bool,
    pub message: String,
}

/// A fatal error plus the id of the record it left behind, if any.
#[derive(Debug)]
pub struct UploadFailure {
    pub id: Option<Uuid>,
    pub error: PipelineError,
}

impl UploadFailure {
    fn before_record(error: impl Into<PipelineError>) -> Self {
        Self {
            id: None,
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PipelineSettings {
    pub jpeg_quality: Quality,
    /// Mirror processed results. Only meaningful with a configured bucket.
    pub mirror_enabled: bool,
    /// Where scoped temp files go; `None` means the system temp dir.
    pub work_dir: Option<PathBuf>,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            jpeg_quality: Quality::new(config.output.jpeg_quality),
            mirror_enabled: config.remote.mirror_enabled(),
            work_dir: config.storage.work_dir.clone(),
        }
    }
}

pub struct Pipeline {
    settings: PipelineSettings,
    primary: Arc<dyn PrimaryStore>,
    records: Arc<dyn RecordStore>,
    mirror: Option<RemoteMirror>,
}

impl Pipeline {
    pub fn new(
        settings: PipelineSettings,
        primary: Arc<dyn PrimaryStore>,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            settings,
            primary,
            records,
            mirror: None,
        }
    }

    pub fn with_mirror(mut self, mirror: RemoteMirror) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Assemble stores and mirror from configuration.
    ///
    /// The bucket client is created once and shared between the bucket
    /// primary store and the mirror. A mirror that can't be set up is logged
    /// and skipped; a bucket primary store that can't be set up is an error.
    pub fn from_config(config: &AppConfig) -> Result<Self, PersistenceError> {
        let bucket_primary = config.storage.backend == StorageBackend::Bucket;
        let settings = PipelineSettings::from_config(config);

        let s3 = if bucket_primary || settings.mirror_enabled {
            match S3Backend::from_config(&config.remote) {
                Ok(backend) => Some(Arc::new(backend)),
                Err(e) if bucket_primary => return Err(e.into()),
                Err(e) => {
                    warn!(error = %e, "remote mirror unavailable, continuing without it");
                    None
                }
            }
        } else {
            None
        };

        let primary: Arc<dyn PrimaryStore> = match (&config.storage.backend, &s3) {
            (StorageBackend::Bucket, Some(backend)) => Arc::new(BucketStore::new(backend.clone())),
            _ => Arc::new(LocalStore::new(
                &config.storage.media_root,
                &config.storage.media_url,
            )),
        };
        let records = Arc::new(JsonRecordStore::new(&config.storage.records_dir));

        let pipeline = Self::new(settings, primary, records);
        Ok(match s3 {
            Some(backend) => pipeline.with_mirror(RemoteMirror::new(backend)),
            None => pipeline,
        })
    }

    pub fn records(&self) -> &Arc<dyn RecordStore> {
        &self.records
    }

    pub fn primary(&self) -> &Arc<dyn PrimaryStore> {
        &self.primary
    }

    /// Process one upload and report the outcome.
    pub fn process_upload(&self, raw_bytes: &[u8], filename: &str, filter_type: &str) -> UploadOutcome {
        match self.process(raw_bytes, filename, filter_type) {
            Ok(record) => {
                info!(
                    id = %record.id,
                    filename,
                    filter = %record.filter_type,
                    mirrored = record.remote_url.is_some(),
                    "upload processed"
                );
                UploadOutcome {
                    id: Some(record.id),
                    success: true,
                    message: format!(
                        "Image processed successfully with the {} filter!",
                        record.filter_type.label()
                    ),
                }
            }
            Err(failure) => {
                error!(
                    id = ?failure.id,
                    filename,
                    filter = filter_type,
                    error = %failure.error,
                    "upload failed"
                );
                UploadOutcome {
                    id: failure.id,
                    success: false,
                    message: failure.error.user_message().to_string(),
                }
            }
        }
    }

    /// Process one upload and return the final record.
    pub fn process(
        &self,
        raw_bytes: &[u8],
        filename: &str,
        filter_type: &str,
    ) -> Result<ProcessedImage, UploadFailure> {
        let filter: Filter = filter_type.parse().map_err(UploadFailure::before_record)?;
        let image = imaging::decode(raw_bytes).map_err(UploadFailure::before_record)?;
        debug!(filename, %filter, width = image.width(), height = image.height(), "decoded upload");

        let mut record = self
            .create_record(raw_bytes, filename, filter, &image)
            .map_err(UploadFailure::before_record)?;
        let id = record.id;

        self.finish_record(&mut record, &image)
            .map_err(|error| UploadFailure {
                id: Some(id),
                error,
            })?;
        Ok(record)
    }

    fn create_record(
        &self,
        raw_bytes: &[u8],
        filename: &str,
        filter: Filter,
        image: &DynamicImage,
    ) -> Result<ProcessedImage, PersistenceError> {
        let id = Uuid::new_v4();
        let original = self
            .primary
            .save(raw_bytes, &naming::original_path_hint(id, filename))?;
        let record = ProcessedImage {
            id,
            original_filename: filename.to_string(),
            original_blob_ref: original,
            processed_blob_ref: None,
            filter_type: filter,
            remote_url: None,
            file_size: Some(raw_bytes.len() as u64),
            width: Some(image.width()),
            height: Some(image.height()),
            original_sha256: format!("{:x}", Sha256::digest(raw_bytes)),
            created_at: Utc::now(),
        };
        self.records.create(&record)?;
        debug!(%id, original = %record.original_blob_ref, "record created");
        Ok(record)
    }

    fn finish_record(
        &self,
        record: &mut ProcessedImage,
        image: &DynamicImage,
    ) -> Result<(), PipelineError> {
        let filter = record.filter_type;
        let result = filter.apply(image);
        let encoded = self.encode_scoped(&result)?;

        let processed = self
            .primary
            .save(&encoded, &naming::processed_path_hint(record.id, filter))?;
        debug!(id = %record.id, processed = %processed, bytes = encoded.len(), "result persisted");

        record.remote_url = self.mirror_result(record.id, filter, &processed);
        record.processed_blob_ref = Some(processed);
        self.records.update(record)?;
        Ok(())
    }

    /// Encode through a temp file that is removed when this function returns,
    /// whichever way it returns.
    fn encode_scoped(&self, image: &DynamicImage) -> Result<Vec<u8>, PipelineError> {
        let scratch_dir = self
            .settings
            .work_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        let scratch = tempfile::Builder::new()
            .prefix("pixel-forge-")
            .suffix(".jpg")
            .tempfile_in(&scratch_dir)
            .map_err(|e| PersistenceError::io(&scratch_dir, e))?;

        write_scratch(&scratch, image, self.settings.jpeg_quality)?;
        let bytes =
            std::fs::read(scratch.path()).map_err(|e| PersistenceError::io(scratch.path(), e))?;
        Ok(bytes)
    }

    fn mirror_result(&self, id: Uuid, filter: Filter, processed: &BlobRef) -> Option<String> {
        if !self.settings.mirror_enabled {
            debug!(%id, "mirroring disabled");
            return None;
        }
        match self.primary.path_or_url(processed) {
            Location::Url(url) => Some(url),
            Location::Path(path) => {
                let mirror = self.mirror.as_ref()?;
                let key = RemoteMirror::key_for(id, filter.name(), PROCESSED_EXTENSION);
                let url = mirror.upload(&path, &key);
                if url.is_none() {
                    debug!(%id, key, "keeping local result only");
                }
                url
            }
        }
    }
}

fn write_scratch(
    scratch: &NamedTempFile,
    image: &DynamicImage,
    quality: Quality,
) -> Result<(), PipelineError> {
    let mut writer = BufWriter::new(scratch.as_file());
    imaging::write_jpeg(image, quality, &mut writer)?;
    writer
        .flush()
        .map_err(|e| PersistenceError::io(scratch.path(), e))?;
    Ok(())
}
