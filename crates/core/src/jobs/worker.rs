//! Queue workers.
//!
//! Each worker loops: claim one job, run the fetcher for it in a separate
//! task bounded by the job timeout, then ack, release or discard it. Workers
//! share nothing but the queue and the fetcher handle.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::model::FetchJob;
use super::queue::JobQueue;
use crate::errors::{Error, Result};
use crate::prices::{FetchOutcome, PriceFetcherTrait};

const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(60 * 60);

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// Number of workers in the pool
    pub concurrency: usize,
    /// Sleep between claims when the queue is empty
    pub poll_interval: Duration,
    /// Upper bound on one job, provider call and inserts included
    pub job_timeout: Duration,
    /// Deliveries after which a retryable failure is dropped
    pub max_attempts: u32,
    /// Base delay before a released job is claimable again, doubled per attempt
    pub retry_backoff: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 2,
            poll_interval: Duration::from_secs(1),
            job_timeout: Duration::from_secs(300),
            max_attempts: 3,
            retry_backoff: Duration::from_secs(30),
        }
    }
}

impl WorkerConfig {
    /// Delay before the next delivery of a job that has been tried `attempts` times.
    pub fn backoff_for(&self, attempts: u32) -> Duration {
        let exp = attempts.saturating_sub(1).min(16);
        self.retry_backoff
            .saturating_mul(1u32 << exp)
            .min(MAX_RETRY_BACKOFF)
    }
}

/// What happened to a claimed job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded { inserted: usize },
    Retried { error: String, retry_after: Duration },
    Discarded { error: String },
}

pub struct Worker {
    id: usize,
    queue: Arc<dyn JobQueue>,
    fetcher: Arc<dyn PriceFetcherTrait>,
    config: WorkerConfig,
}

impl Worker {
    pub fn new(
        id: usize,
        queue: Arc<dyn JobQueue>,
        fetcher: Arc<dyn PriceFetcherTrait>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            id,
            queue,
            fetcher,
            config,
        }
    }

    /// Claims and settles at most one job. `Ok(None)` means the queue was empty.
    pub async fn run_once(&self) -> Result<Option<JobOutcome>> {
        let Some(job) = self.queue.claim().await? else {
            return Ok(None);
        };
        debug!(
            "Worker {} claimed job {} for {} (attempt {})",
            self.id, job.id, job.symbol, job.attempts
        );
        let result = self.execute(&job).await;
        self.settle(&job, result).await.map(Some)
    }

    /// Runs until `shutdown` flips to true or its sender is dropped.
    ///
    /// A job in flight when shutdown is signalled is finished first.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("Worker {} started", self.id);
        loop {
            if *shutdown.borrow() {
                break;
            }
            match self.run_once().await {
                Ok(Some(_)) => continue,
                Ok(None) => {}
                Err(e) => error!("Worker {} could not reach the job queue: {}", self.id, e),
            }
            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!("Worker {} stopped", self.id);
    }

    /// Runs the fetcher in its own task so a panic stays inside the job.
    async fn execute(&self, job: &FetchJob) -> Result<FetchOutcome> {
        let fetcher = Arc::clone(&self.fetcher);
        let (symbol, start, end) = (job.symbol.clone(), job.start, job.end);
        let task = tokio::spawn(async move { fetcher.fetch_and_store(&symbol, start, end).await });
        let abort = task.abort_handle();

        match tokio::time::timeout(self.config.job_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) if join_err.is_panic() => {
                Err(Error::Unexpected(format!("job {} panicked", job.id)))
            }
            Ok(Err(join_err)) => Err(Error::Unexpected(format!(
                "job {} was cancelled: {}",
                job.id, join_err
            ))),
            Err(_) => {
                abort.abort();
                Err(Error::JobTimeout(self.config.job_timeout.as_secs()))
            }
        }
    }

    async fn settle(&self, job: &FetchJob, result: Result<FetchOutcome>) -> Result<JobOutcome> {
        match result {
            Ok(outcome) => {
                self.queue.ack(&job.id).await?;
                info!(
                    "Job {} for {} done: {} new row(s)",
                    job.id, job.symbol, outcome.inserted
                );
                Ok(JobOutcome::Succeeded {
                    inserted: outcome.inserted,
                })
            }
            Err(e) => {
                let message = e.to_string();
                if e.retry_class().is_retryable() && job.attempts < self.config.max_attempts {
                    let retry_after = self.config.backoff_for(job.attempts);
                    warn!(
                        "Job {} for {} failed (attempt {}/{}), retrying in {:?}: {}",
                        job.id,
                        job.symbol,
                        job.attempts,
                        self.config.max_attempts,
                        retry_after,
                        message
                    );
                    self.queue.release(&job.id, retry_after, &message).await?;
                    Ok(JobOutcome::Retried {
                        error: message,
                        retry_after,
                    })
                } else {
                    error!(
                        "Job {} for {} failed after {} attempt(s), dropping: {}",
                        job.id, job.symbol, job.attempts, message
                    );
                    self.queue.discard(&job.id, &message).await?;
                    Ok(JobOutcome::Discarded { error: message })
                }
            }
        }
    }
}

/// A set of workers sharing one queue.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    shutdown: watch::Sender<bool>,
}

impl WorkerPool {
    /// Starts `config.concurrency` workers (at least one).
    pub fn spawn(
        config: WorkerConfig,
        queue: Arc<dyn JobQueue>,
        fetcher: Arc<dyn PriceFetcherTrait>,
    ) -> Self {
        let (shutdown, rx) = watch::channel(false);
        let count = config.concurrency.max(1);
        let handles = (0..count)
            .map(|id| {
                let worker = Worker::new(id, queue.clone(), fetcher.clone(), config.clone());
                tokio::spawn(worker.run(rx.clone()))
            })
            .collect();
        info!("Worker pool started with {} worker(s)", count);
        Self { handles, shutdown }
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Signals every worker and waits for in-flight jobs to settle.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!("Worker task ended abnormally: {}", e);
            }
        }
        info!("Worker pool stopped");
    }
}
