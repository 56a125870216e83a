//! # Design
//!
//! - A job's own failure is carried verbatim in [`JobError::Failed`] so callers
//!   recover their domain error without downcasting.
//! - Scheduler-level outcomes (panic, abandonment, timeout) get their own
//!   variants with constant messages.

use std::any::Any;
use std::time::Duration;

use thiserror::Error;

/// Outcome type delivered through a job's completion signal.
pub type JobResult<T, E> = Result<T, JobError<E>>;

/// Reasons a job's completion signal can settle without a success value.
#[derive(Debug, Clone, Error)]
pub enum JobError<E> {
    /// The job function returned an error.
    #[error("job failed")]
    Failed(#[source] E),
    /// The job function panicked while running.
    #[error("job panicked")]
    Panicked {
        /// Panic payload rendered as text.
        message: String,
    },
    /// The job was dropped before it settled.
    #[error("job abandoned before completion")]
    Abandoned,
    /// The caller stopped waiting before the job settled.
    #[error("job timed out")]
    TimedOut {
        /// How long the caller waited.
        after: Duration,
    },
}

impl<E> JobError<E> {
    pub(crate) fn panicked(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|text| (*text).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self::Panicked { message }
    }

    /// Returns the job's own error when the job function failed.
    #[must_use]
    pub const fn failure(&self) -> Option<&E> {
        match self {
            Self::Failed(err) => Some(err),
            Self::Panicked { .. } | Self::Abandoned | Self::TimedOut { .. } => None,
        }
    }

    /// Transform the job's own error while keeping scheduler outcomes intact.
    pub fn map_failed<F>(self, map: impl FnOnce(E) -> F) -> JobError<F> {
        match self {
            Self::Failed(err) => JobError::Failed(map(err)),
            Self::Panicked { message } => JobError::Panicked { message },
            Self::Abandoned => JobError::Abandoned,
            Self::TimedOut { after } => JobError::TimedOut { after },
        }
    }
}
