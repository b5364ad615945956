//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Process
//!
//! ```text
//! 001 holiday.png → sepia
//!     Id: 6f1c2a0e-8d7b-4f6e-9a51-2c4d3e5f6a7b
//!     Image processed successfully with the Sepia filter!
//! 002 notes.txt → sepia
//!     Failed: The uploaded file is not a valid image.
//!
//! Processed 1 of 2 uploads
//! ```
//!
//! ## Show
//!
//! ```text
//! 6f1c2a0e-8d7b-4f6e-9a51-2c4d3e5f6a7b holiday.png
//!     Filter: Sepia
//!     Size: 640x480, 2.5 MB
//!     Original: uploads/original/6f1c…_holiday.png
//!     Processed: uploads/processed/processed_6f1c…_sepia.jpg
//!     Remote: https://bucket.s3.us-east-1.amazonaws.com/processed_images/6f1c…_sepia.jpg
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::imaging::Filter;
use crate::pipeline::UploadOutcome;
use crate::record::ProcessedImage;
use crate::remote::BucketStats;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

// ============================================================================
// process
// ============================================================================

/// Format the result of one upload.
pub fn format_outcome(index: usize, source: &str, filter: &str, outcome: &UploadOutcome) -> Vec<String> {
    let mut lines = vec![format!("{} {} \u{2192} {}", format_index(index), source, filter)];
    if let Some(id) = outcome.id {
        lines.push(format!("{}Id: {}", indent(1), id));
    }
    if outcome.success {
        lines.push(format!("{}{}", indent(1), outcome.message));
    } else {
        lines.push(format!("{}Failed: {}", indent(1), outcome.message));
    }
    lines
}

/// One-line tally for a batch.
pub fn format_batch_summary(outcomes: &[UploadOutcome]) -> String {
    let ok = outcomes.iter().filter(|o| o.success).count();
    let noun = if outcomes.len() == 1 { "upload" } else { "uploads" };
    format!("Processed {} of {} {}", ok, outcomes.len(), noun)
}

pub fn print_outcomes(results: &[(String, UploadOutcome)], filter: &str) {
    for (i, (source, outcome)) in results.iter().enumerate() {
        for line in format_outcome(i + 1, source, filter, outcome) {
            println!("{}", line);
        }
    }
    let outcomes: Vec<UploadOutcome> = results.iter().map(|(_, o)| o.clone()).collect();
    println!();
    println!("{}", format_batch_summary(&outcomes));
}

// ============================================================================
// filters
// ============================================================================

fn aliases(filter: Filter) -> &'static [&'static str] {
    match filter {
        Filter::Grayscale => &["gray"],
        Filter::Solarize => &["solar"],
        _ => &[],
    }
}

/// List every filter name with its label and accepted aliases.
pub fn format_filters() -> Vec<String> {
    let width = Filter::ALL.iter().map(|f| f.name().len()).max().unwrap_or(0);
    Filter::ALL
        .iter()
        .map(|&f| {
            let names = aliases(f);
            if names.is_empty() {
                format!("{:<width$}  {}", f.name(), f.label())
            } else {
                format!(
                    "{:<width$}  {} (alias: {})",
                    f.name(),
                    f.label(),
                    names.join(", ")
                )
            }
        })
        .collect()
}

pub fn print_filters() {
    for line in format_filters() {
        println!("{}", line);
    }
}

// ============================================================================
// show
// ============================================================================

/// Human-readable summary of a stored record.
pub fn format_record(record: &ProcessedImage) -> Vec<String> {
    let mut lines = vec![format!("{} {}", record.id, record.original_filename)];
    lines.push(format!("{}Filter: {}", indent(1), record.filter_type.label()));

    let dims = match (record.width, record.height) {
        (Some(w), Some(h)) => Some(format!("{}x{}", w, h)),
        _ => None,
    };
    let size = record.file_size_mb().map(|mb| format!("{} MB", mb));
    match (dims, size) {
        (Some(d), Some(s)) => lines.push(format!("{}Size: {}, {}", indent(1), d, s)),
        (Some(d), None) => lines.push(format!("{}Size: {}", indent(1), d)),
        (None, Some(s)) => lines.push(format!("{}Size: {}", indent(1), s)),
        (None, None) => {}
    }

    lines.push(format!("{}Original: {}", indent(1), record.original_blob_ref));
    match &record.processed_blob_ref {
        Some(blob) => lines.push(format!("{}Processed: {}", indent(1), blob)),
        None => lines.push(format!("{}Processed: (not processed)", indent(1))),
    }
    if let Some(url) = &record.remote_url {
        lines.push(format!("{}Remote: {}", indent(1), url));
    }
    lines.push(format!(
        "{}Created: {}",
        indent(1),
        record.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    lines
}

pub fn print_record(record: &ProcessedImage) {
    for line in format_record(record) {
        println!("{}", line);
    }
}

// ============================================================================
// stats
// ============================================================================

pub fn format_stats(bucket: &str, stats: Option<&BucketStats>) -> Vec<String> {
    let Some(stats) = stats else {
        return vec![format!("Bucket {}: statistics unavailable", bucket)];
    };
    let mut lines = vec![format!("Bucket {}", bucket)];
    lines.push(format!("{}Objects: {}", indent(1), stats.object_count));
    lines.push(format!(
        "{}Total size: {} MB ({} bytes)",
        indent(1),
        stats.total_size_mb(),
        stats.total_size_bytes
    ));
    if let Some(t) = stats.last_modified {
        lines.push(format!(
            "{}Last modified: {}",
            indent(1),
            t.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    lines
}

pub fn print_stats(bucket: &str, stats: Option<&BucketStats>) {
    for line in format_stats(bucket, stats) {
        println!("{}", line);
    }
}
