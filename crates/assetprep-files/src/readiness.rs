//! Single-resolution readiness signal with replay-safe waiting.
//!
//! The state is memoized in a watch channel: waiting after the signal settled
//! returns the stored outcome immediately, and every waiter observes the same
//! outcome.

use std::fmt;

use tokio::sync::watch;

use crate::error::{FileError, FileResult};

#[derive(Debug, Clone)]
enum ReadyState {
    Pending,
    Ready,
    Failed(FileError),
}

/// Observable completion of a file's background work.
pub struct Readiness {
    state: watch::Sender<ReadyState>,
}

impl Readiness {
    /// A signal that settles later through [`Readiness::resolve`] or [`Readiness::fail`].
    pub(crate) fn pending() -> Self {
        let (state, _) = watch::channel(ReadyState::Pending);
        Self { state }
    }

    /// A signal that is already resolved.
    pub(crate) fn resolved() -> Self {
        let (state, _) = watch::channel(ReadyState::Ready);
        Self { state }
    }

    /// Settle successfully. Has no effect once settled.
    pub(crate) fn resolve(&self) -> bool {
        self.settle(ReadyState::Ready)
    }

    /// Settle with a failure. Has no effect once settled.
    pub(crate) fn fail(&self, error: FileError) -> bool {
        self.settle(ReadyState::Failed(error))
    }

    fn settle(&self, outcome: ReadyState) -> bool {
        self.state.send_if_modified(|state| {
            if matches!(state, ReadyState::Pending) {
                *state = outcome;
                true
            } else {
                false
            }
        })
    }

    /// Whether the signal has settled either way.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        !matches!(*self.state.borrow(), ReadyState::Pending)
    }

    /// Wait until the signal settles.
    ///
    /// # Errors
    ///
    /// Returns the stored failure when background work failed.
    pub async fn wait(&self) -> FileResult<()> {
        let mut receiver = self.state.subscribe();
        let settled = receiver
            .wait_for(|state| !matches!(state, ReadyState::Pending))
            .await
            .map(|state| (*state).clone());
        match settled {
            Ok(ReadyState::Failed(error)) => Err(error),
            // The sender lives in `self`, so the channel cannot close while borrowed.
            Ok(_) | Err(_) => Ok(()),
        }
    }
}

impl fmt::Debug for Readiness {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match *self.state.borrow() {
            ReadyState::Pending => "pending",
            ReadyState::Ready => "ready",
            ReadyState::Failed(_) => "failed",
        };
        formatter.debug_tuple("Readiness").field(&label).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn waiters_attached_after_resolution_still_complete() -> anyhow::Result<()> {
        let readiness = Readiness::pending();
        assert!(!readiness.is_settled());
        assert!(readiness.resolve());

        readiness.wait().await?;
        readiness.wait().await?;
        assert!(readiness.is_settled());
        Ok(())
    }

    #[tokio::test]
    async fn failure_is_replayed_and_settles_once() {
        let readiness = Readiness::pending();
        let err = FileError::validation("path", "empty", None);
        assert!(readiness.fail(err));
        assert!(!readiness.resolve());

        assert!(readiness.wait().await.is_err());
        assert!(readiness.wait().await.is_err());
    }

    #[tokio::test]
    async fn pending_waiters_wake_on_resolution() -> anyhow::Result<()> {
        let readiness = Arc::new(Readiness::pending());
        let waiter = {
            let readiness = Arc::clone(&readiness);
            tokio::spawn(async move { readiness.wait().await })
        };
        tokio::task::yield_now().await;
        readiness.resolve();

        waiter.await??;
        Ok(())
    }
}
