use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::{debug, warn};

use super::model::{FetchJobDB, NewFetchJobDB, STATUS_QUEUED, STATUS_RUNNING};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::fetch_jobs::dsl as jobs_dsl;
use crate::utils::format_queue_timestamp;
use quoteflow_core::jobs::{FetchJob, FetchRequest, JobId, JobQueue};
use quoteflow_core::Result;

/// How long a claimed job stays invisible before another worker may take it.
pub const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(600);

/// Durable job queue in the `fetch_jobs` table.
///
/// Every mutation goes through the writer actor, so a claim is a single
/// serialized select-then-update and no two workers can lease the same row.
pub struct JobQueueRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
    visibility_timeout: Duration,
}

impl JobQueueRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self {
            pool,
            writer,
            visibility_timeout: DEFAULT_VISIBILITY_TIMEOUT,
        }
    }

    pub fn with_visibility_timeout(mut self, timeout: Duration) -> Self {
        self.visibility_timeout = timeout;
        self
    }

    /// Last recorded failure for a job still in the queue.
    pub fn last_error(&self, id: &JobId) -> Result<Option<String>> {
        let mut conn = get_connection(&self.pool)?;
        let row = jobs_dsl::fetch_jobs
            .find(id.as_str())
            .select(jobs_dsl::last_error)
            .first::<Option<String>>(&mut conn)
            .optional()
            .into_core()?;
        Ok(row.flatten())
    }
}

fn offset(now: DateTime<Utc>, delay: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(delay)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or_else(|| now + chrono::Duration::days(3650))
}

#[async_trait]
impl JobQueue for JobQueueRepository {
    async fn enqueue(&self, request: FetchRequest) -> Result<JobId> {
        let request = request.validated()?;
        let id = JobId::new();
        let row = NewFetchJobDB::queued(&id, &request, Utc::now());

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::insert_into(jobs_dsl::fetch_jobs)
                    .values(&row)
                    .execute(conn)
                    .into_core()?;
                Ok(())
            })
            .await?;

        debug!("Queued job {} for {}", id, request.symbol);
        Ok(id)
    }

    async fn claim(&self) -> Result<Option<FetchJob>> {
        let visibility = self.visibility_timeout;

        let claimed = self
            .writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Option<FetchJobDB>> {
                let now = Utc::now();
                let now_str = format_queue_timestamp(&now);

                let candidate = jobs_dsl::fetch_jobs
                    .filter(jobs_dsl::visible_at.le(now_str.as_str()))
                    .order((jobs_dsl::visible_at.asc(), jobs_dsl::enqueued_at.asc()))
                    .select(FetchJobDB::as_select())
                    .first::<FetchJobDB>(conn)
                    .optional()
                    .into_core()?;

                let Some(mut row) = candidate else {
                    return Ok(None);
                };

                row.status = STATUS_RUNNING.to_string();
                row.attempts += 1;
                row.visible_at = format_queue_timestamp(&offset(now, visibility));

                diesel::update(jobs_dsl::fetch_jobs.find(row.id.as_str()))
                    .set((
                        jobs_dsl::status.eq(row.status.as_str()),
                        jobs_dsl::attempts.eq(row.attempts),
                        jobs_dsl::visible_at.eq(row.visible_at.as_str()),
                    ))
                    .execute(conn)
                    .into_core()?;

                Ok(Some(row))
            })
            .await?;

        claimed.map(FetchJob::try_from).transpose()
    }

    async fn ack(&self, id: &JobId) -> Result<()> {
        let key = id.to_string();
        let deleted = self
            .writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                diesel::delete(jobs_dsl::fetch_jobs.find(key))
                    .execute(conn)
                    .into_core()
            })
            .await?;
        if deleted == 0 {
            debug!("Ack for job {} which is no longer queued", id);
        }
        Ok(())
    }

    async fn release(&self, id: &JobId, retry_after: Duration, reason: &str) -> Result<()> {
        let key = id.to_string();
        let reason = reason.to_string();
        let visible_at = format_queue_timestamp(&offset(Utc::now(), retry_after));

        let updated = self
            .writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                diesel::update(jobs_dsl::fetch_jobs.find(key))
                    .set((
                        jobs_dsl::status.eq(STATUS_QUEUED),
                        jobs_dsl::visible_at.eq(visible_at),
                        jobs_dsl::last_error.eq(Some(reason)),
                    ))
                    .execute(conn)
                    .into_core()
            })
            .await?;
        if updated == 0 {
            warn!("Release for unknown job {}", id);
        }
        Ok(())
    }

    async fn discard(&self, id: &JobId, reason: &str) -> Result<()> {
        let key = id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                diesel::delete(jobs_dsl::fetch_jobs.find(key))
                    .execute(conn)
                    .into_core()
            })
            .await?;
        debug!("Discarded job {}: {}", id, reason);
        Ok(())
    }

    fn pending(&self) -> Result<usize> {
        let mut conn = get_connection(&self.pool)?;
        let count: i64 = jobs_dsl::fetch_jobs
            .count()
            .get_result(&mut conn)
            .into_core()?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, spawn_writer};
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn open(path: &str, visibility: Duration) -> JobQueueRepository {
        let pool = create_pool(path).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        let writer = spawn_writer((*pool).clone());
        JobQueueRepository::new(pool, writer).with_visibility_timeout(visibility)
    }

    fn create_test_queue(visibility: Duration) -> (JobQueueRepository, tempfile::TempDir) {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("queue.db");
        let queue = open(&db_path.to_string_lossy(), visibility);
        (queue, temp_dir)
    }

    #[tokio::test]
    async fn test_claims_in_fifo_order() {
        let (queue, _temp_dir) = create_test_queue(DEFAULT_VISIBILITY_TIMEOUT);

        let first = queue.enqueue(FetchRequest::for_symbol("AAA")).await.unwrap();
        let second = queue.enqueue(FetchRequest::for_symbol("BBB")).await.unwrap();
        assert_eq!(queue.pending().unwrap(), 2);

        let a = queue.claim().await.unwrap().unwrap();
        let b = queue.claim().await.unwrap().unwrap();
        assert_eq!((a.id, a.symbol.as_str(), a.attempts), (first, "AAA", 1));
        assert_eq!((b.id, b.symbol.as_str()), (second, "BBB"));
        assert!(queue.claim().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_request_dates_survive_the_queue() {
        let (queue, _temp_dir) = create_test_queue(DEFAULT_VISIBILITY_TIMEOUT);

        let request = FetchRequest {
            symbol: " ABC ".into(),
            start: NaiveDate::from_ymd_opt(2024, 1, 1),
            end: NaiveDate::from_ymd_opt(2024, 3, 31),
        };
        queue.enqueue(request).await.unwrap();

        let job = queue.claim().await.unwrap().unwrap();
        assert_eq!(job.symbol, "ABC");
        assert_eq!(job.start, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(job.end, NaiveDate::from_ymd_opt(2024, 3, 31));
    }

    #[tokio::test]
    async fn test_blank_symbol_is_rejected() {
        let (queue, _temp_dir) = create_test_queue(DEFAULT_VISIBILITY_TIMEOUT);
        assert!(queue.enqueue(FetchRequest::for_symbol("  ")).await.is_err());
        assert_eq!(queue.pending().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_expired_lease_is_redelivered() {
        let (queue, _temp_dir) = create_test_queue(Duration::ZERO);

        let id = queue.enqueue(FetchRequest::for_symbol("ABC")).await.unwrap();
        let first = queue.claim().await.unwrap().unwrap();
        let second = queue.claim().await.unwrap().unwrap();

        assert_eq!(first.id, id);
        assert_eq!(second.id, id);
        assert_eq!(second.attempts, 2);
    }

    #[tokio::test]
    async fn test_release_delays_and_records_reason() {
        let (queue, _temp_dir) = create_test_queue(DEFAULT_VISIBILITY_TIMEOUT);

        let id = queue.enqueue(FetchRequest::for_symbol("ABC")).await.unwrap();
        queue.claim().await.unwrap().unwrap();

        queue
            .release(&id, Duration::from_secs(60), "rate limited")
            .await
            .unwrap();
        assert!(queue.claim().await.unwrap().is_none());
        assert_eq!(queue.pending().unwrap(), 1);
        assert_eq!(queue.last_error(&id).unwrap().as_deref(), Some("rate limited"));

        queue.release(&id, Duration::ZERO, "again").await.unwrap();
        let job = queue.claim().await.unwrap().unwrap();
        assert_eq!(job.attempts, 2);
    }

    #[tokio::test]
    async fn test_ack_and_discard_remove_jobs() {
        let (queue, _temp_dir) = create_test_queue(DEFAULT_VISIBILITY_TIMEOUT);

        let a = queue.enqueue(FetchRequest::for_symbol("AAA")).await.unwrap();
        let b = queue.enqueue(FetchRequest::for_symbol("BBB")).await.unwrap();
        queue.claim().await.unwrap();
        queue.claim().await.unwrap();

        queue.ack(&a).await.unwrap();
        queue.discard(&b, "symbol not found").await.unwrap();
        assert_eq!(queue.pending().unwrap(), 0);

        // Late ack after another worker finished the job
        queue.ack(&a).await.unwrap();
    }

    #[tokio::test]
    async fn test_jobs_survive_reopening_the_database() {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("queue.db").to_string_lossy().to_string();

        let id = {
            let queue = open(&db_path, DEFAULT_VISIBILITY_TIMEOUT);
            queue.enqueue(FetchRequest::for_symbol("ABC")).await.unwrap()
        };

        let reopened = open(&db_path, DEFAULT_VISIBILITY_TIMEOUT);
        assert_eq!(reopened.pending().unwrap(), 1);
        let job = reopened.claim().await.unwrap().unwrap();
        assert_eq!(job.id, id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_never_share_a_job() {
        let (queue, _temp_dir) = create_test_queue(DEFAULT_VISIBILITY_TIMEOUT);
        for i in 0..20 {
            queue
                .enqueue(FetchRequest::for_symbol(format!("S{}", i)))
                .await
                .unwrap();
        }
        let queue = Arc::new(queue);

        let mut handles = Vec::new();
        for _ in 0..4 {
            let queue = Arc::clone(&queue);
            handles.push(tokio::spawn(async move {
                let mut ids = Vec::new();
                while let Some(job) = queue.claim().await.unwrap() {
                    ids.push(job.id);
                }
                ids
            }));
        }

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap());
        }
        let total = all.len();
        all.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        all.dedup();
        assert_eq!(total, 20);
        assert_eq!(all.len(), 20);
    }
}
