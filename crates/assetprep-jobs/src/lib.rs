#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(
    missing_docs,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

//! Bounded-concurrency job scheduling for background file work.
//!
//! A [`JobQueue`] holds a FIFO backlog of pending jobs. [`Worker`]s attach to
//! a queue and drain it one job at a time; attaching N workers (see
//! [`WorkerPool`]) raises the concurrency bound to N. Every push returns a
//! [`JobHandle`] that settles exactly once with the job's outcome.
//!
//! Layout: `error.rs` (job failure taxonomy), `queue.rs` (backlog, occupied
//! signal, completion handles), `worker.rs` (the draining loop).

pub mod error;
pub mod queue;
pub mod worker;

pub use error::{JobError, JobResult};
pub use queue::{JobHandle, JobId, JobQueue, QueueStats};
pub use worker::{Worker, WorkerPool};
