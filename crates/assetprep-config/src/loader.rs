//! Layered configuration loading: defaults, then a JSON file, then the environment.
//!
//! # Design
//! - Environment lookups go through an injected function so loading is
//!   testable without mutating process state.
//! - Validation runs once, after every layer is applied.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::model::PipelineConfig;
use crate::validate::{self, parse_count, parse_flag, parse_list};

/// Prefix shared by every recognised environment variable.
pub const ENV_PREFIX: &str = "ASSETPREP_";

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Builds a validated [`PipelineConfig`] from its layers.
pub struct ConfigLoader {
    file: Option<PathBuf>,
    env: EnvLookup,
}

impl ConfigLoader {
    /// Loader reading the process environment and no file.
    #[must_use]
    pub fn new() -> Self {
        Self {
            file: None,
            env: Box::new(|key| std::env::var(key).ok()),
        }
    }

    /// Overlay a JSON document from `path` on top of the defaults.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Replace the environment lookup.
    #[must_use]
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Box::new(lookup);
        self
    }

    /// Apply every layer and validate the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] or [`ConfigError::Parse`] when the file
    /// cannot be used, and [`ConfigError::InvalidField`] when an environment
    /// value cannot be parsed or the final configuration is invalid.
    pub fn load(&self) -> ConfigResult<PipelineConfig> {
        let mut config = match &self.file {
            Some(path) => read_file(path)?,
            None => PipelineConfig::default(),
        };
        self.apply_env(&mut config)?;
        validate::validate(&config)?;
        debug!(
            metadata_workers = config.metadata_workers,
            stat_concurrency = config.stat_concurrency,
            include_hidden = config.include_hidden,
            strategies = ?config.strategies,
            "configuration loaded"
        );
        Ok(config)
    }

    fn var(&self, name: &str) -> Option<(String, String)> {
        let key = format!("{ENV_PREFIX}{name}");
        (self.env)(&key).map(|value| (key, value))
    }

    fn apply_env(&self, config: &mut PipelineConfig) -> ConfigResult<()> {
        if let Some((key, raw)) = self.var("METADATA_WORKERS") {
            config.metadata_workers = parse_count("env", &key, &raw)?;
        }
        if let Some((key, raw)) = self.var("STAT_CONCURRENCY") {
            config.stat_concurrency = parse_count("env", &key, &raw)?;
        }
        if let Some((key, raw)) = self.var("INCLUDE_HIDDEN") {
            config.include_hidden = parse_flag("env", &key, &raw)?;
        }
        if let Some((_, raw)) = self.var("STRATEGIES") {
            config.strategies = parse_list(&raw);
        }
        if let Some((_, raw)) = self.var("LOG_LEVEL") {
            config.log_level = raw.trim().to_string();
        }
        if let Some((_, raw)) = self.var("LOG_FORMAT") {
            config.log_format = raw.trim().to_ascii_lowercase();
        }
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConfigLoader {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ConfigLoader")
            .field("file", &self.file)
            .finish_non_exhaustive()
    }
}

fn read_file(path: &Path) -> ConfigResult<PipelineConfig> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        operation: "config.read",
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use assetprep_test_support::TempTree;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + Send + Sync + 'static {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_file_or_env() -> anyhow::Result<()> {
        let config = ConfigLoader::new().with_env(env_of(&[])).load()?;
        assert_eq!(config, PipelineConfig::default());
        Ok(())
    }

    #[test]
    fn env_overrides_file_which_overrides_defaults() -> anyhow::Result<()> {
        let tree = TempTree::with_files([(
            "assetprep.json",
            r#"{"metadata_workers": 8, "strategies": ["gzip"], "log_format": "json"}"#,
        )])?;
        let config = ConfigLoader::new()
            .with_file(tree.join("assetprep.json"))
            .with_env(env_of(&[
                ("ASSETPREP_METADATA_WORKERS", "2"),
                ("ASSETPREP_INCLUDE_HIDDEN", "yes"),
                ("ASSETPREP_STRATEGIES", "clone, gzip-suffix"),
            ]))
            .load()?;

        assert_eq!(config.metadata_workers, 2);
        assert_eq!(config.stat_concurrency, 100);
        assert!(config.include_hidden);
        assert_eq!(config.strategies, vec!["clone", "gzip-suffix"]);
        assert_eq!(config.log_format, "json");
        Ok(())
    }

    #[test]
    fn malformed_env_value_names_the_variable() {
        let outcome = ConfigLoader::new()
            .with_env(env_of(&[("ASSETPREP_STAT_CONCURRENCY", "lots")]))
            .load();
        assert!(matches!(
            outcome,
            Err(ConfigError::InvalidField { ref section, ref field, .. })
                if section == "env" && field == "ASSETPREP_STAT_CONCURRENCY"
        ));
    }

    #[test]
    fn invalid_layered_result_fails_validation() {
        let outcome = ConfigLoader::new()
            .with_env(env_of(&[("ASSETPREP_STRATEGIES", " , ")]))
            .load();
        assert!(matches!(
            outcome,
            Err(ConfigError::InvalidField { reason: "must not be empty", .. })
        ));
    }

    #[test]
    fn file_errors_are_distinguished() -> anyhow::Result<()> {
        let tree = TempTree::with_files([("bad.json", "{not json"), ("extra.json", r#"{"x": 1}"#)])?;

        let missing = ConfigLoader::new()
            .with_file(tree.join("absent.json"))
            .with_env(env_of(&[]))
            .load();
        assert!(matches!(missing, Err(ConfigError::Io { .. })));

        for name in ["bad.json", "extra.json"] {
            let outcome = ConfigLoader::new()
                .with_file(tree.join(name))
                .with_env(env_of(&[]))
                .load();
            assert!(matches!(outcome, Err(ConfigError::Parse { .. })));
        }
        Ok(())
    }
}
