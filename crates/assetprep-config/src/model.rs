//! Typed pipeline configuration.

use serde::{Deserialize, Serialize};

use crate::defaults;

/// Settings for one discovery and strategy run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Workers attached to the shared job queue (the concurrency bound).
    pub metadata_workers: usize,
    /// Maximum concurrent stat operations during discovery.
    pub stat_concurrency: usize,
    /// Whether dot-files and dot-directories are discovered.
    pub include_hidden: bool,
    /// Strategies applied when the caller names none.
    pub strategies: Vec<String>,
    /// Tracing level used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Log output format, `pretty` or `json`.
    pub log_format: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            metadata_workers: defaults::METADATA_WORKERS,
            stat_concurrency: defaults::STAT_CONCURRENCY,
            include_hidden: false,
            strategies: vec![defaults::STRATEGY.to_string()],
            log_level: defaults::LOG_LEVEL.to_string(),
            log_format: defaults::LOG_FORMAT.to_string(),
        }
    }
}
