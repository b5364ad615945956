//! Deterministic names for stored artifacts.
//!
//! Every name is derived from the record id, so two uploads can never
//! collide in the primary store or the bucket:
//!
//! | Artifact | Name |
//! |---|---|
//! | Original upload | `uploads/original/{id}_{sanitized filename}` |
//! | Processed result | `uploads/processed/processed_{id}_{filter}.jpg` |
//! | Remote mirror key | `processed_images/{id}_{filter}.{ext}` |

use crate::imaging::Filter;
use uuid::Uuid;

pub const ORIGINAL_DIR: &str = "uploads/original";
pub const PROCESSED_DIR: &str = "uploads/processed";
pub const REMOTE_PREFIX: &str = "processed_images";
pub const PROCESSED_EXTENSION: &str = "jpg";

/// File name of a processed artifact: `processed_{id}_{filter}.jpg`.
pub fn processed_file_name(id: Uuid, filter: Filter) -> String {
    format!("processed_{id}_{filter}.{PROCESSED_EXTENSION}")
}

/// Primary-store path hint for a processed artifact.
pub fn processed_path_hint(id: Uuid, filter: Filter) -> String {
    format!("{PROCESSED_DIR}/{}", processed_file_name(id, filter))
}

/// Primary-store path hint for an original upload.
pub fn original_path_hint(id: Uuid, filename: &str) -> String {
    format!("{ORIGINAL_DIR}/{id}_{}", sanitize_filename(filename))
}

/// Remote object key: `processed_images/{id}_{filter_type}.{extension}`.
pub fn key_for(id: Uuid, filter_type: &str, extension: &str) -> String {
    format!("{REMOTE_PREFIX}/{id}_{filter_type}.{extension}")
}

/// Reduce a client-supplied filename to a safe single path component.
///
/// Directory parts are dropped, anything outside `[A-Za-z0-9._-]` becomes
/// `_`, and leading dots are stripped so the result is never hidden or a
/// parent reference. Falls back to `upload` when nothing usable remains.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}
