//! # Pixel Forge
//!
//! Takes an uploaded raster image, applies one of a fixed set of pixel
//! filters, stores the original and the JPEG result, and optionally mirrors
//! the result to an S3-compatible bucket.
//!
//! # Architecture: One Upload, One Pipeline
//!
//! ```text
//! bytes ─▶ Filter Engine ─▶ primary store ─▶ remote mirror (optional)
//!            (imaging)        (storage)          (remote)
//!                 └──────── record (record) ────────┘
//! ```
//!
//! Each upload is an independent, sequential unit of work. Nothing is shared
//! between uploads except the stores, and every upload gets a fresh UUID, so
//! batches run in parallel without coordination.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Pure filters (`grayscale`, `sepia`, `poster`, `blur`, `edge`, `solarize`), decode, JPEG encode |
//! | [`pipeline`] | Drives one upload end to end; the only place errors become user messages |
//! | [`storage`] | Primary store trait with filesystem and bucket implementations |
//! | [`record`] | The `ProcessedImage` record and its JSON store |
//! | [`remote`] | Object store adapter: best-effort upload, delete, key naming, bucket stats |
//! | [`naming`] | Deterministic artifact names and filename sanitizing |
//! | [`config`] | Layered `pixel-forge.toml` loading, env overlay, validation |
//! | [`batch`] | Files and directories → parallel uploads |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Filters Are an Enum
//!
//! The filter set is closed, so it is a plain enum dispatched by `match`.
//! An unknown name fails at parse time, before any record is written.
//!
//! ## Mirroring Never Fails an Upload
//!
//! The primary store is the source of truth. A bucket outage, bad
//! credentials or a placeholder bucket name only mean `remote_url` stays
//! empty; the upload itself still succeeds.
//!
//! ## Synchronous Core
//!
//! The pipeline is plain blocking code run on rayon. The AWS SDK is async,
//! so [`remote::S3Backend`] owns a current-thread tokio runtime and blocks
//! on each request. Nothing else in the crate knows about async.
//!
//! ## Explicit Configuration
//!
//! The pipeline and stores hold no globals and never look at the
//! environment. An [`config::AppConfig`] is built once by
//! [`config::load_config`] (stock defaults → file → environment) and passed
//! to constructors.

pub mod batch;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod record;
pub mod remote;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_helpers;
