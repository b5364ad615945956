//! Shared test utilities.
//!
//! Synthetic images (so no fixture files are needed) and in-memory or
//! failure-injecting stand-ins for the store traits.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let upload = encode_png(&gradient_rgb(100, 100));
//! let records = Arc::new(MemoryRecordStore::default());
//! let store = FailingStore::failing_on(local_store, "uploads/processed/");
//! ```

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use uuid::Uuid;

use crate::record::{ProcessedImage, RecordStore};
use crate::storage::{BlobRef, Location, PersistenceError, PrimaryStore};

// =========================================================================
// Synthetic images
// =========================================================================

/// RGB image with a horizontal red ramp, vertical green ramp and a fixed
/// blue channel. Every pixel differs from its neighbours.
pub fn gradient_rgb(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x + y) % 256) as u8,
        ])
    });
    DynamicImage::ImageRgb8(img)
}

/// Like [`gradient_rgb`], with alpha ramping along the diagonal.
pub fn gradient_rgba(width: u32, height: u32) -> DynamicImage {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
            ((x + y) * 255 / (width + height).max(1)) as u8,
        ])
    });
    DynamicImage::ImageRgba8(img)
}

/// Encode an image as PNG bytes, the way a client would upload it.
pub fn encode_png(image: &DynamicImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

// =========================================================================
// Store doubles
// =========================================================================

/// Record store kept in a map. Mutex so it is Sync for rayon tests.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: Mutex<HashMap<Uuid, ProcessedImage>>,
    fail_updates: AtomicBool,
}

impl MemoryRecordStore {
    /// Creates succeed, every update fails.
    pub fn failing_updates() -> Self {
        let store = Self::default();
        store.fail_updates.store(true, Ordering::SeqCst);
        store
    }

    pub fn all(&self) -> Vec<ProcessedImage> {
        self.records.lock().unwrap().values().cloned().collect()
    }
}

impl RecordStore for MemoryRecordStore {
    fn create(&self, record: &ProcessedImage) -> Result<(), PersistenceError> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&record.id) {
            return Err(PersistenceError::InvalidPath(format!("duplicate {}", record.id)));
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    fn update(&self, record: &ProcessedImage) -> Result<(), PersistenceError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(PersistenceError::io(
                format!("{}.json", record.id),
                std::io::Error::other("injected failure"),
            ));
        }
        let mut records = self.records.lock().unwrap();
        match records.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(PersistenceError::NotFound(record.id.to_string())),
        }
    }

    fn get(&self, id: Uuid) -> Result<Option<ProcessedImage>, PersistenceError> {
        Ok(self.records.lock().unwrap().get(&id).cloned())
    }
}

/// Wraps a real store and fails every save whose path hint starts with
/// `prefix`.
pub struct FailingStore {
    inner: Arc<dyn PrimaryStore>,
    prefix: String,
}

impl FailingStore {
    pub fn failing_on(inner: Arc<dyn PrimaryStore>, prefix: &str) -> Self {
        Self {
            inner,
            prefix: prefix.to_string(),
        }
    }
}

impl PrimaryStore for FailingStore {
    fn save(&self, blob: &[u8], path_hint: &str) -> Result<BlobRef, PersistenceError> {
        if path_hint.starts_with(&self.prefix) {
            return Err(PersistenceError::io(
                path_hint,
                std::io::Error::other("injected failure"),
            ));
        }
        self.inner.save(blob, path_hint)
    }

    fn read(&self, blob: &BlobRef) -> Result<Vec<u8>, PersistenceError> {
        self.inner.read(blob)
    }

    fn path_or_url(&self, blob: &BlobRef) -> Location {
        self.inner.path_or_url(blob)
    }
}
