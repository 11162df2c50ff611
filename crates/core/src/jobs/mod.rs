//! Durable fetch jobs: model, queue trait and the worker pool that drains it.
//!
//! Delivery is at-least-once. A job is leased by `claim`, and either acked
//! (deleted), released (made available again after a delay) or discarded.
//! A lease that expires without any of those makes the job claimable again,
//! which is how a crashed worker's job gets redelivered.

pub mod model;
pub mod queue;
pub mod worker;


pub use model::{FetchJob, FetchRequest, JobId};
pub use queue::JobQueue;
pub use worker::{JobOutcome, Worker, WorkerConfig, WorkerPool};
