//! Feeding files from disk through the pipeline.
//!
//! Paths given on the command line may be files or directories. Directories
//! are walked recursively and only files with a supported image extension
//! are kept; explicitly named files are always kept, so a bad upload still
//! produces a (failed) outcome instead of being skipped silently.
//!
//! Uploads are independent, so the batch runs in parallel on the global
//! rayon pool. Results come back in input order.

use crate::pipeline::{Pipeline, UploadOutcome};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "gif", "bmp", "tif", "tiff",
];

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Path not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("{failed} of {total} uploads failed")]
    Failed { failed: usize, total: usize },
}

fn is_image(path: &Path) -> bool {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}

/// Expand files and directories into the list of files to upload.
pub fn collect_uploads(paths: &[PathBuf]) -> Result<Vec<PathBuf>, BatchError> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            let mut found = Vec::new();
            for entry in WalkDir::new(path).follow_links(true) {
                let entry = entry.map_err(|source| BatchError::Walk {
                    path: path.clone(),
                    source,
                })?;
                if entry.file_type().is_file() && is_image(entry.path()) {
                    found.push(entry.into_path());
                }
            }
            found.sort();
            files.extend(found);
        } else {
            return Err(BatchError::NotFound(path.clone()));
        }
    }
    Ok(files)
}

/// Run every file through the pipeline with `filter_type`.
///
/// Returns `(display name, outcome)` pairs in input order. An unreadable
/// file yields a failed outcome rather than aborting the batch.
pub fn process_files(
    pipeline: &Pipeline,
    files: &[PathBuf],
    filter_type: &str,
) -> Vec<(String, UploadOutcome)> {
    files
        .par_iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            let outcome = match std::fs::read(path) {
                Ok(bytes) => pipeline.process_upload(&bytes, &name, filter_type),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "could not read upload");
                    UploadOutcome {
                        id: None,
                        success: false,
                        message: format!("Could not read file: {e}"),
                    }
                }
            };
            (path.display().to_string(), outcome)
        })
        .collect()
}

/// Turn a batch with any failed upload into an error.
pub fn check_outcomes(results: &[(String, UploadOutcome)]) -> Result<(), BatchError> {
    let failed = results.iter().filter(|(_, o)| !o.success).count();
    if failed > 0 {
        return Err(BatchError::Failed {
            failed,
            total: results.len(),
        });
    }
    Ok(())
}
