//! Job queue trait.

use std::time::Duration;

use async_trait::async_trait;

use super::model::{FetchJob, FetchRequest, JobId};
use crate::errors::Result;

/// Durable, at-least-once work queue for fetch jobs.
///
/// Implementations must persist a job before `enqueue` returns and must make
/// a claimed job claimable again once its lease runs out.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Records the job and returns its id without waiting for execution.
    async fn enqueue(&self, request: FetchRequest) -> Result<JobId>;

    /// Leases the oldest available job, if any.
    async fn claim(&self) -> Result<Option<FetchJob>>;

    /// Job finished; remove it.
    async fn ack(&self, id: &JobId) -> Result<()>;

    /// Job failed but may succeed later; make it available after `retry_after`.
    async fn release(&self, id: &JobId, retry_after: Duration, reason: &str) -> Result<()>;

    /// Job failed for good; remove it.
    async fn discard(&self, id: &JobId, reason: &str) -> Result<()>;

    /// Jobs waiting or leased.
    fn pending(&self) -> Result<usize>;
}
