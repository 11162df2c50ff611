use super::DbPool;
use crate::errors::StorageError;
use diesel::SqliteConnection;
use log::error;
use quoteflow_core::errors::Result;
use std::any::Any;
use std::thread;
use tokio::sync::{mpsc, oneshot};

// A job receives the writer's connection and runs inside an immediate
// transaction. Returning Err rolls the transaction back.
type Job<T> = Box<dyn FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static>;

type ErasedJob = Job<Box<dyn Any + Send + 'static>>;
type Reply = oneshot::Sender<Result<Box<dyn Any + Send + 'static>>>;

/// Handle for sending jobs to the writer actor.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<(ErasedJob, Reply)>,
}

impl WriteHandle {
    /// Executes a database job on the writer actor's dedicated connection.
    ///
    /// The job runs in its own `BEGIN IMMEDIATE` transaction, committed when
    /// it returns `Ok` and rolled back when it returns `Err`. The job's error
    /// is returned unchanged.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static + Any,
    {
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send((
                Box::new(move |c| job(c).map(|v| Box::new(v) as Box<dyn Any + Send>)),
                ret_tx,
            ))
            .await
            .map_err(|_| StorageError::WriterUnavailable("writer actor stopped".into()))?;

        let boxed = ret_rx.await.map_err(|_| {
            StorageError::WriterUnavailable("writer actor dropped the reply".into())
        })??;

        boxed.downcast::<T>().map(|v| *v).map_err(|_| {
            StorageError::WriterUnavailable("writer actor returned an unexpected type".into())
                .into()
        })
    }
}

/// Spawns the single writer for the database.
///
/// The writer owns one pooled connection on a dedicated OS thread, so Diesel's
/// blocking calls never occupy a runtime worker shared with HTTP handlers or
/// the worker pool. It exits once every `WriteHandle` is dropped.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    // Bounded; producers wait when the writer falls behind
    let (tx, mut rx) = mpsc::channel::<(ErasedJob, Reply)>(1024);

    let spawned = thread::Builder::new()
        .name("sqlite-writer".into())
        .spawn(move || {
            let mut conn = match pool.get() {
                Ok(conn) => conn,
                Err(e) => {
                    error!("Writer actor could not acquire a database connection: {}", e);
                    let reason = e.to_string();
                    while let Some((_, reply_tx)) = rx.blocking_recv() {
                        let _ = reply_tx
                            .send(Err(StorageError::WriterUnavailable(reason.clone()).into()));
                    }
                    return;
                }
            };

            while let Some((job, reply_tx)) = rx.blocking_recv() {
                let result: Result<Box<dyn Any + Send + 'static>> = conn
                    .immediate_transaction::<_, StorageError, _>(|c| {
                        job(c).map_err(StorageError::from)
                    })
                    .map_err(|e: StorageError| e.into());

                // Receiver may have been dropped by a cancelled caller
                let _ = reply_tx.send(result);
            }
        });

    // A failed spawn drops the receiver; every exec then reports WriterUnavailable
    if let Err(e) = spawned {
        error!("Failed to start the writer thread: {}", e);
    }

    WriteHandle { tx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_pool;
    use quoteflow_core::errors::{Error, ValidationError};
    use tempfile::tempdir;

    fn writer() -> (tempfile::TempDir, WriteHandle) {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("writer.db").to_string_lossy().to_string();
        let pool = create_pool(&db_path).expect("Failed to create pool");
        (temp_dir, spawn_writer((*pool).clone()))
    }

    #[tokio::test]
    async fn test_jobs_run_off_the_async_runtime() {
        let (_tmp, writer) = writer();

        let outside_runtime = writer
            .exec(|_| Ok(tokio::runtime::Handle::try_current().is_err()))
            .await
            .unwrap();
        assert!(outside_runtime);
    }

    #[tokio::test]
    async fn test_job_error_is_returned_unchanged() {
        let (_tmp, writer) = writer();

        let result: Result<()> = writer
            .exec(|_| Err(ValidationError::InvalidInput("nope".into()).into()))
            .await;
        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::InvalidInput(_)))
        ));

        // The writer keeps serving after a failed job
        let value = writer.exec(|_| Ok(7_i32)).await.unwrap();
        assert_eq!(value, 7);
    }
}
