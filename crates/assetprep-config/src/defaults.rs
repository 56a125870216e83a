//! Default values and bounds for pipeline configuration.
//!
//! # Design
//! - Centralize defaults so the model, loader, and CLI help agree.

/// Workers attached to the shared job queue.
pub(crate) const METADATA_WORKERS: usize = 4;
/// Concurrent stat operations during discovery.
pub(crate) const STAT_CONCURRENCY: usize = 100;
/// Strategy applied when none is requested.
pub(crate) const STRATEGY: &str = "clone";
/// Tracing level when `RUST_LOG` is unset.
pub(crate) const LOG_LEVEL: &str = "info";
/// Human-readable output by default.
pub(crate) const LOG_FORMAT: &str = "pretty";
/// Accepted log format names.
pub(crate) const LOG_FORMATS: [&str; 2] = ["pretty", "json"];
/// Inclusive upper bound for worker and stat counts.
pub(crate) const MAX_CONCURRENCY: usize = 1024;
