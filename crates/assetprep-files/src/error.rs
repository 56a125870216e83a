//! # Design
//!
//! - Structured, constant-message errors for file discovery, metadata and strategies.
//! - Errors are `Clone` so a single readiness failure can be replayed to every waiter;
//!   non-cloneable sources are shared behind `Arc`.
//! - Context (operation, path, field) lives in fields, never in the message.

use std::convert::Infallible;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use assetprep_jobs::JobError;
use thiserror::Error;

/// Result type for file pipeline operations.
pub type FileResult<T> = Result<T, FileError>;

/// Errors produced while discovering, probing, or transforming files.
#[derive(Debug, Clone, Error)]
pub enum FileError {
    /// IO failures while stat-ing or reading a file.
    #[error("file io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: Arc<io::Error>,
    },
    /// Directory traversal failures.
    #[error("file walkdir failure")]
    Walkdir {
        /// Operation that triggered the traversal failure.
        operation: &'static str,
        /// Root of the traversal.
        path: PathBuf,
        /// Underlying walkdir error.
        source: Arc<walkdir::Error>,
    },
    /// Gzip compression failures.
    #[error("file compression failure")]
    Compression {
        /// Logical path of the file being compressed.
        path: String,
        /// Underlying encoder error.
        source: Arc<io::Error>,
    },
    /// Malformed arguments rejected before any work starts.
    #[error("file invalid input")]
    Validation {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
    /// A background job settled without running to completion.
    #[error("file background job failure")]
    Job {
        /// Operation the job was performing.
        operation: &'static str,
        /// Logical path of the file the job belonged to.
        path: String,
        /// Scheduler outcome.
        source: JobError<Infallible>,
    },
}

impl FileError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source: Arc::new(source),
        }
    }

    pub(crate) fn walkdir(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: walkdir::Error,
    ) -> Self {
        Self::Walkdir {
            operation,
            path: path.into(),
            source: Arc::new(source),
        }
    }

    pub(crate) fn compression(path: impl Into<String>, source: io::Error) -> Self {
        Self::Compression {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    pub(crate) const fn validation(
        field: &'static str,
        reason: &'static str,
        value: Option<String>,
    ) -> Self {
        Self::Validation {
            field,
            reason,
            value,
        }
    }

    /// Unwrap a job outcome: the job's own error passes through unchanged,
    /// scheduler outcomes are wrapped with the operation and path.
    pub(crate) fn from_job(
        operation: &'static str,
        path: impl Into<String>,
        outcome: JobError<Self>,
    ) -> Self {
        let source = match outcome {
            JobError::Failed(err) => return err,
            JobError::Panicked { message } => JobError::Panicked { message },
            JobError::Abandoned => JobError::Abandoned,
            JobError::TimedOut { after } => JobError::TimedOut { after },
        };
        Self::Job {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Whether this error was raised synchronously by argument validation.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use walkdir::WalkDir;

    #[test]
    fn helpers_build_variants_with_sources() -> anyhow::Result<()> {
        let io_err = FileError::io("stat", "a.txt", io::Error::other("io"));
        assert!(matches!(io_err, FileError::Io { operation: "stat", .. }));
        assert!(io_err.source().is_some());

        let temp = tempfile::Builder::new().prefix("assetprep-files-").tempdir()?;
        let missing = temp.path().join("missing");
        let walk_error = WalkDir::new(&missing)
            .into_iter()
            .next()
            .and_then(Result::err)
            .ok_or_else(|| io::Error::other("expected walkdir error"))?;
        let walk_err = FileError::walkdir("discover.walk", &missing, walk_error);
        assert!(walk_err.source().is_some());

        let gzip_err = FileError::compression("a.txt", io::Error::other("deflate"));
        assert!(gzip_err.source().is_some());

        let invalid = FileError::validation("strategy", "unknown strategy", Some("bogus".into()));
        assert!(invalid.is_validation());
        assert_eq!(invalid.to_string(), "file invalid input");
        Ok(())
    }

    #[test]
    fn clones_share_the_underlying_source() {
        let original = FileError::io("read", "a.txt", io::Error::other("gone"));
        let copy = original.clone();
        match (original, copy) {
            (FileError::Io { source: left, .. }, FileError::Io { source: right, .. }) => {
                assert!(Arc::ptr_eq(&left, &right));
            }
            _ => panic!("expected io variants"),
        }
    }

    #[test]
    fn from_job_passes_failures_through_and_wraps_scheduler_outcomes() {
        let own = FileError::validation("path", "empty", None);
        let passed = FileError::from_job("metadata", "a.txt", JobError::Failed(own));
        assert!(passed.is_validation());

        let wrapped = FileError::from_job("metadata", "a.txt", JobError::Abandoned);
        assert!(matches!(
            wrapped,
            FileError::Job {
                operation: "metadata",
                source: JobError::Abandoned,
                ..
            }
        ));
        assert!(wrapped.source().is_some());
    }
}
