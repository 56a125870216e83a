#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(
    missing_docs,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

//! Asynchronous file-readiness pipeline for static asset trees.
//!
//! [`FileCollection::from_path`] discovers a directory, each [`File`]
//! computes its missing metadata (size, MD5, MIME type) as a job on a shared
//! [`assetprep_jobs::JobQueue`], and strategies turn a ready collection into
//! new ready collections. [`Action`] pairs the result with transport intents.
//!
//! Layout: `error.rs`, `mime.rs` (detection), `probe.rs` (filesystem
//! capability), `readiness.rs`, `file.rs`, `gzip.rs`, `strategy.rs`,
//! `collection.rs`, `action.rs`.

pub mod action;
pub mod collection;
pub mod error;
pub mod file;
mod gzip;
pub mod mime;
pub mod probe;
pub mod readiness;
pub mod strategy;

pub use action::{Action, Intents};
pub use collection::{DiscoveryOptions, FileCollection};
pub use error::{FileError, FileResult};
pub use file::{CONTENT_TYPE, File, FileAttributes, FileContext};
pub use gzip::GZIP_ENCODING;
pub use probe::{FsProbe, MetadataProbe};
pub use readiness::Readiness;
pub use strategy::{Strategy, StrategySelector};
