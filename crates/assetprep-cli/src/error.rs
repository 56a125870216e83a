//! CLI error type and exit-code mapping.

use std::fmt::{self, Display, Formatter};

use assetprep_config::ConfigError;
use assetprep_files::FileError;

/// Error type used by CLI handlers.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }

    /// Map a pipeline error: rejected input is a validation failure, anything
    /// else is a runtime failure carrying `context`.
    pub(crate) fn from_file(context: impl Display, error: FileError) -> Self {
        match error {
            FileError::Validation {
                field,
                reason,
                value,
            } => Self::validation(match value {
                Some(value) => format!("{context}: {field} {reason} ({value})"),
                None => format!("{context}: {field} {reason}"),
            }),
            other => Self::failure(anyhow::Error::new(other).context(context.to_string())),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::InvalidField {
                section,
                field,
                value,
                reason,
            } => Self::validation(match value {
                Some(value) => format!("invalid configuration {section}.{field}: {reason} ({value})"),
                None => format!("invalid configuration {section}.{field}: {reason}"),
            }),
            ConfigError::Io { path, source, .. } => Self::validation(format!(
                "configuration file {} unreadable: {source}",
                path.display()
            )),
            ConfigError::Parse { path, source } => Self::validation(format!(
                "configuration file {} malformed: {source}",
                path.display()
            )),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}
