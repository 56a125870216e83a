//! FIFO job backlog with an "occupied" wake-up signal.
//!
//! Jobs are type-erased on push: the queue only stores boxed closures that
//! settle their own completion channel, so one queue can carry jobs with
//! unrelated result types. Workers block on the queue's [`Notify`] rather
//! than polling.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::sync::{Notify, oneshot, watch};
use tracing::{debug, error};

use crate::error::{JobError, JobResult};

/// Identifier assigned to each pushed job, unique per queue.
pub type JobId = u64;

/// Whether a job settled with a success value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum JobStatus {
    Succeeded,
    Failed,
}

type ImmediateWork = Box<dyn FnOnce() -> JobStatus + Send>;
type DeferredWork = Box<dyn FnOnce() -> BoxFuture<'static, JobStatus> + Send>;

pub(crate) enum Work {
    /// Produces its value synchronously on the worker's turn.
    Immediate(ImmediateWork),
    /// Produces a future the worker awaits before taking the next job.
    Deferred(DeferredWork),
}

pub(crate) struct Job {
    pub(crate) id: JobId,
    pub(crate) work: Work,
}

/// Counters describing queue throughput.
#[derive(Debug, Default)]
pub struct QueueStats {
    pushed: AtomicU64,
    started: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl QueueStats {
    /// Total jobs pushed onto the queue.
    pub fn pushed(&self) -> u64 {
        self.pushed.load(Ordering::Relaxed)
    }

    /// Total jobs a worker has started executing.
    pub fn started(&self) -> u64 {
        self.started.load(Ordering::Relaxed)
    }

    /// Total jobs that settled with a success value.
    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    /// Total jobs that settled with a failure.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub(crate) fn record_started(&self) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_settled(&self, status: JobStatus) {
        match status {
            JobStatus::Succeeded => self.succeeded.fetch_add(1, Ordering::Relaxed),
            JobStatus::Failed => self.failed.fetch_add(1, Ordering::Relaxed),
        };
    }
}

pub(crate) struct Shared {
    backlog: Mutex<VecDeque<Job>>,
    occupied: Notify,
    generation: watch::Sender<u64>,
    next_id: AtomicU64,
    next_worker_id: AtomicUsize,
    pub(crate) stats: QueueStats,
}

impl Shared {
    fn lock_backlog(&self) -> MutexGuard<'_, VecDeque<Job>> {
        match self.backlog.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("job backlog mutex poisoned; continuing with recovered guard");
                poisoned.into_inner()
            }
        }
    }

    pub(crate) fn pop(&self) -> Option<Job> {
        self.lock_backlog().pop_front()
    }

    pub(crate) const fn occupied(&self) -> &Notify {
        &self.occupied
    }

    pub(crate) fn next_worker_id(&self) -> usize {
        self.next_worker_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// Ordered backlog of pending jobs shared by any number of workers.
///
/// Cloning a queue yields another handle to the same backlog.
#[derive(Clone)]
pub struct JobQueue {
    shared: Arc<Shared>,
}

impl JobQueue {
    /// Construct an empty queue. No job runs until a [`crate::Worker`] attaches.
    #[must_use]
    pub fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                backlog: Mutex::new(VecDeque::new()),
                occupied: Notify::new(),
                generation,
                next_id: AtomicU64::new(1),
                next_worker_id: AtomicUsize::new(1),
                stats: QueueStats::default(),
            }),
        }
    }

    /// Push a job whose function produces a deferred value.
    ///
    /// The worker that picks the job up awaits the returned future before it
    /// settles the handle and takes the next job.
    pub fn push<F, Fut, T, E>(&self, job: F) -> JobHandle<T, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let work: DeferredWork = Box::new(move || {
            async move {
                let outcome = match AssertUnwindSafe(async move { job().await })
                    .catch_unwind()
                    .await
                {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(err)) => Err(JobError::Failed(err)),
                    Err(payload) => Err(JobError::panicked(&*payload)),
                };
                settle(sender, outcome)
            }
            .boxed()
        });
        let id = self.enqueue(Work::Deferred(work));
        JobHandle::new(id, receiver)
    }

    /// Push a job whose function produces its value synchronously.
    ///
    /// Synchronous jobs run on the worker's own turn; the worker yields to the
    /// runtime before it checks for more work.
    pub fn push_sync<F, T, E>(&self, job: F) -> JobHandle<T, E>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let work: ImmediateWork = Box::new(move || {
            let outcome = match std::panic::catch_unwind(AssertUnwindSafe(job)) {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => Err(JobError::Failed(err)),
                Err(payload) => Err(JobError::panicked(&*payload)),
            };
            settle(sender, outcome)
        });
        let id = self.enqueue(Work::Immediate(work));
        JobHandle::new(id, receiver)
    }

    /// Number of jobs waiting for a worker.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.lock_backlog().len()
    }

    /// Whether no jobs are waiting for a worker.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.lock_backlog().is_empty()
    }

    /// Throughput counters for this queue.
    #[must_use]
    pub fn stats(&self) -> &QueueStats {
        &self.shared.stats
    }

    /// Observe "occupied" transitions.
    ///
    /// The receiver's value is the number of pushes so far and changes on
    /// every push.
    #[must_use]
    pub fn watch_occupied(&self) -> watch::Receiver<u64> {
        self.shared.generation.subscribe()
    }

    pub(crate) fn shared(&self) -> Arc<Shared> {
        Arc::clone(&self.shared)
    }

    fn enqueue(&self, work: Work) -> JobId {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let depth = {
            let mut backlog = self.shared.lock_backlog();
            backlog.push_back(Job { id, work });
            backlog.len()
        };
        self.shared.stats.pushed.fetch_add(1, Ordering::Relaxed);
        debug!(job_id = id, depth, "job queued");
        self.shared.occupied.notify_one();
        self.shared.generation.send_modify(|pushes| *pushes += 1);
        id
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for JobQueue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("JobQueue")
            .field("pending", &self.len())
            .field("stats", &self.shared.stats)
            .finish()
    }
}

fn settle<T, E>(sender: oneshot::Sender<JobResult<T, E>>, outcome: JobResult<T, E>) -> JobStatus {
    let status = if outcome.is_ok() {
        JobStatus::Succeeded
    } else {
        JobStatus::Failed
    };
    // The caller may have dropped its handle; the job still counts as settled.
    let _ = sender.send(outcome);
    status
}

/// Completion signal for a pushed job.
///
/// Resolves exactly once: with the job's value, with [`JobError::Failed`]
/// carrying the job's own error, or with a scheduler outcome.
#[must_use = "a job handle does nothing unless awaited"]
pub struct JobHandle<T, E> {
    id: JobId,
    receiver: oneshot::Receiver<JobResult<T, E>>,
}

impl<T, E> JobHandle<T, E> {
    const fn new(id: JobId, receiver: oneshot::Receiver<JobResult<T, E>>) -> Self {
        Self { id, receiver }
    }

    /// Identifier assigned when the job was pushed.
    #[must_use]
    pub const fn id(&self) -> JobId {
        self.id
    }

    /// Wait for the job, giving up after `after`.
    ///
    /// Giving up does not stop the job; it keeps its place in the queue and
    /// runs to completion.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::TimedOut`] when the job has not settled in time,
    /// otherwise whatever the job itself settled with.
    pub async fn wait_timeout(self, after: Duration) -> JobResult<T, E> {
        match tokio::time::timeout(after, self).await {
            Ok(outcome) => outcome,
            Err(_) => Err(JobError::TimedOut { after }),
        }
    }
}

impl<T, E> Future for JobHandle<T, E> {
    type Output = JobResult<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(JobError::Abandoned)))
    }
}

impl<T, E> fmt::Debug for JobHandle<T, E> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("JobHandle")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[tokio::test]
    async fn pushes_are_fifo_and_counted() {
        let queue = JobQueue::new();
        let first: JobHandle<u8, io::Error> = queue.push_sync(|| Ok(1));
        let second: JobHandle<u8, io::Error> = queue.push(|| async { Ok(2) });

        assert_eq!(queue.len(), 2);
        assert!(first.id() < second.id());
        assert_eq!(queue.stats().pushed(), 2);

        let shared = queue.shared();
        let popped = shared.pop().map(|job| job.id);
        assert_eq!(popped, Some(first.id()));
    }

    #[tokio::test]
    async fn dropped_queue_abandons_pending_jobs() {
        let queue = JobQueue::new();
        let handle: JobHandle<(), io::Error> = queue.push_sync(|| Ok(()));
        drop(queue);

        assert!(matches!(handle.await, Err(JobError::Abandoned)));
    }

    #[tokio::test]
    async fn wait_timeout_reports_timeout_without_worker() {
        let queue = JobQueue::new();
        let handle: JobHandle<(), io::Error> = queue.push_sync(|| Ok(()));

        let outcome = handle.wait_timeout(Duration::from_millis(20)).await;
        assert!(matches!(outcome, Err(JobError::TimedOut { .. })));
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn watch_occupied_changes_on_every_push() -> anyhow::Result<()> {
        let queue = JobQueue::new();
        let mut occupied = queue.watch_occupied();

        let _first: JobHandle<(), io::Error> = queue.push_sync(|| Ok(()));
        occupied.changed().await?;
        assert_eq!(*occupied.borrow_and_update(), 1);

        let _second: JobHandle<(), io::Error> = queue.push_sync(|| Ok(()));
        occupied.changed().await?;
        assert_eq!(*occupied.borrow_and_update(), 2);
        Ok(())
    }
}
