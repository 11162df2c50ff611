use quoteflow_core::jobs::WorkerPool;
use quoteflow_core::scheduler::SchedulerGuard;
use quoteflow_server::{
    api::app_router, build_state, config::Config, init_tracing,
    scheduler::start_price_scheduler,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing();
    let state = build_state(&config).await?;

    start_price_scheduler(&state, SchedulerGuard::from_env());

    let workers = config.embedded_workers.then(|| {
        WorkerPool::spawn(
            config.worker_config(),
            state.queue.clone(),
            state.fetcher.clone(),
        )
    });

    let router = app_router(state.clone(), &config);
    tracing::info!("Listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.scheduler.shutdown().await;
    if let Some(pool) = workers {
        pool.shutdown().await;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
