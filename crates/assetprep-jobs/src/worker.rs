//! Workers that drain a [`JobQueue`] one job at a time.
//!
//! # Design
//! - Each worker is a spawned task that alternates between idle (parked on
//!   the queue's occupied signal) and running exactly one job.
//! - A worker never starts job N+1 before job N has settled.
//! - Workers live as long as the runtime; there is no shutdown state.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::queue::{Job, JobQueue, JobStatus, Shared, Work};

/// Single-concurrency consumer attached to a [`JobQueue`].
#[derive(Debug)]
pub struct Worker {
    id: usize,
    task: JoinHandle<()>,
}

impl Worker {
    /// Attach a worker to `queue` and start draining it.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    #[must_use]
    pub fn spawn(queue: &JobQueue) -> Self {
        let shared = queue.shared();
        let id = shared.next_worker_id();
        let task = tokio::spawn(run(id, shared));
        debug!(worker_id = id, "worker attached");
        Self { id, task }
    }

    /// Identifier unique among the workers attached to one queue, used in log fields.
    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Whether the worker task has stopped (only after a runtime shutdown).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

async fn run(id: usize, shared: Arc<Shared>) {
    loop {
        let job = {
            // Register before checking the backlog so a push that lands between
            // the check and the wait still wakes this worker. The registration
            // is dropped before the job runs, so a busy worker never absorbs a
            // wake-up meant for an idle one.
            let occupied = shared.occupied().notified();
            tokio::pin!(occupied);
            occupied.as_mut().enable();

            match shared.pop() {
                Some(job) => job,
                None => {
                    trace!(worker_id = id, "worker idle");
                    occupied.await;
                    continue;
                }
            }
        };
        execute(id, &shared, job).await;
    }
}

async fn execute(worker_id: usize, shared: &Shared, job: Job) {
    let Job { id, work } = job;
    shared.stats.record_started();
    trace!(worker_id, job_id = id, "job started");

    match work {
        Work::Immediate(call) => {
            settled(worker_id, shared, id, call());
            // Next check happens on a later turn so long synchronous backlogs
            // cannot starve the rest of the runtime.
            tokio::task::yield_now().await;
        }
        Work::Deferred(start) => {
            let status = start().await;
            settled(worker_id, shared, id, status);
        }
    }
}

fn settled(worker_id: usize, shared: &Shared, job_id: u64, status: JobStatus) {
    shared.stats.record_settled(status);
    match status {
        JobStatus::Succeeded => trace!(worker_id, job_id, "job settled"),
        JobStatus::Failed => warn!(worker_id, job_id, "job settled with failure"),
    }
}

/// A fixed set of workers sharing one queue, bounding concurrency to its size.
#[derive(Debug)]
pub struct WorkerPool {
    workers: Vec<Worker>,
}

impl WorkerPool {
    /// Attach `size` workers to `queue`. A size of zero is raised to one.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    #[must_use]
    pub fn spawn(queue: &JobQueue, size: usize) -> Self {
        let size = size.max(1);
        let workers = (0..size).map(|_| Worker::spawn(queue)).collect();
        debug!(size, "worker pool attached");
        Self { workers }
    }

    /// Number of workers in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Always `false`: a pool holds at least one worker.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Workers in attachment order.
    #[must_use]
    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }
}
