//! Validation helpers and parsing utilities for configuration values.

use assetprep_files::Strategy;

use crate::defaults::{LOG_FORMATS, MAX_CONCURRENCY};
use crate::error::{ConfigError, ConfigResult};
use crate::model::PipelineConfig;

const SECTION: &str = "pipeline";

/// Check every field of a fully layered configuration.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for the first field that is out of
/// range or outside its vocabulary.
pub fn validate(config: &PipelineConfig) -> ConfigResult<()> {
    ensure_concurrency("metadata_workers", config.metadata_workers)?;
    ensure_concurrency("stat_concurrency", config.stat_concurrency)?;
    ensure_strategies(&config.strategies)?;
    ensure_log_format(&config.log_format)?;
    if config.log_level.trim().is_empty() {
        return Err(ConfigError::invalid(SECTION, "log_level", None, "must not be empty"));
    }
    Ok(())
}

fn ensure_concurrency(field: &str, value: usize) -> ConfigResult<()> {
    if (1..=MAX_CONCURRENCY).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            SECTION,
            field,
            Some(value.to_string()),
            "must be between 1 and 1024",
        ))
    }
}

fn ensure_strategies(strategies: &[String]) -> ConfigResult<()> {
    if strategies.is_empty() {
        return Err(ConfigError::invalid(SECTION, "strategies", None, "must not be empty"));
    }
    for name in strategies {
        name.parse::<Strategy>().map_err(|_| {
            ConfigError::invalid(SECTION, "strategies", Some(name.clone()), "unknown strategy")
        })?;
    }
    Ok(())
}

fn ensure_log_format(format: &str) -> ConfigResult<()> {
    if LOG_FORMATS.contains(&format) {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            SECTION,
            "log_format",
            Some(format.to_string()),
            "must be pretty or json",
        ))
    }
}

/// Parse a positive count from an environment value.
pub(crate) fn parse_count(section: &str, field: &str, raw: &str) -> ConfigResult<usize> {
    raw.trim().parse::<usize>().map_err(|_| {
        ConfigError::invalid(section, field, Some(raw.to_string()), "must be an unsigned integer")
    })
}

/// Parse a boolean flag from an environment value.
pub(crate) fn parse_flag(section: &str, field: &str, raw: &str) -> ConfigResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(
            section,
            field,
            Some(raw.to_string()),
            "must be a boolean",
        )),
    }
}

/// Split a comma separated list, dropping empty items.
pub(crate) fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason_of(outcome: ConfigResult<()>) -> Option<(String, &'static str)> {
        match outcome {
            Err(ConfigError::InvalidField { field, reason, .. }) => Some((field, reason)),
            _ => None,
        }
    }

    #[test]
    fn defaults_are_valid() -> anyhow::Result<()> {
        validate(&PipelineConfig::default())?;
        Ok(())
    }

    #[test]
    fn rejects_out_of_range_counts() {
        let zero = PipelineConfig {
            metadata_workers: 0,
            ..PipelineConfig::default()
        };
        assert_eq!(
            reason_of(validate(&zero)),
            Some(("metadata_workers".to_string(), "must be between 1 and 1024"))
        );

        let huge = PipelineConfig {
            stat_concurrency: 5000,
            ..PipelineConfig::default()
        };
        assert_eq!(
            reason_of(validate(&huge)).map(|(field, _)| field),
            Some("stat_concurrency".to_string())
        );
    }

    #[test]
    fn rejects_empty_or_unknown_strategies() {
        let empty = PipelineConfig {
            strategies: Vec::new(),
            ..PipelineConfig::default()
        };
        assert_eq!(
            reason_of(validate(&empty)),
            Some(("strategies".to_string(), "must not be empty"))
        );

        let unknown = PipelineConfig {
            strategies: vec!["gzip".into(), "brotli".into()],
            ..PipelineConfig::default()
        };
        assert_eq!(
            reason_of(validate(&unknown)),
            Some(("strategies".to_string(), "unknown strategy"))
        );
    }

    #[test]
    fn rejects_unknown_log_format() {
        let config = PipelineConfig {
            log_format: "xml".into(),
            ..PipelineConfig::default()
        };
        assert_eq!(
            reason_of(validate(&config)).map(|(field, _)| field),
            Some("log_format".to_string())
        );
    }

    #[test]
    fn parses_env_scalars() -> anyhow::Result<()> {
        assert_eq!(parse_count("env", "workers", " 12 ")?, 12);
        assert!(parse_count("env", "workers", "-1").is_err());
        assert!(parse_flag("env", "hidden", "TRUE")?);
        assert!(!parse_flag("env", "hidden", "off")?);
        assert!(parse_flag("env", "hidden", "maybe").is_err());
        assert_eq!(parse_list("clone, gzip,,"), vec!["clone", "gzip"]);
        Ok(())
    }
}
