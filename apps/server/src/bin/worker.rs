//! Standalone queue consumer. Shares the server's configuration and store.

use quoteflow_core::jobs::WorkerPool;
use quoteflow_server::{build_state, config::Config, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing();
    let state = build_state(&config).await?;

    let pool = WorkerPool::spawn(
        config.worker_config(),
        state.queue.clone(),
        state.fetcher.clone(),
    );
    tracing::info!(
        "Worker process running {} worker(s); {} job(s) pending",
        pool.size(),
        state.queue.pending()?
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down, waiting for in-flight jobs");
    pool.shutdown().await;
    Ok(())
}
