use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use quoteflow_core::{
    jobs::JobQueue,
    prices::{PriceFetcher, PriceFetcherTrait, PriceStore},
    scheduler::Scheduler,
};
use quoteflow_market_data::{MarketDataProvider, YahooProvider};
use quoteflow_storage_sqlite::{
    db::{self, write_actor},
    JobQueueRepository, PriceRepository,
};

pub struct AppState {
    pub price_store: Arc<dyn PriceStore>,
    pub fetcher: Arc<dyn PriceFetcherTrait>,
    pub queue: Arc<dyn JobQueue>,
    pub scheduler: Arc<Scheduler>,
}

pub fn init_tracing() {
    let log_format = std::env::var("QF_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// Opens the store and queue and wires them to the Yahoo provider.
pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let mut provider = YahooProvider::new(config.provider_timeout)?;
    if let Some(base_url) = &config.yahoo_base_url {
        provider = provider.with_base_url(base_url.clone());
    }
    build_state_with_provider(config, Arc::new(provider)).await
}

pub async fn build_state_with_provider(
    config: &Config,
    provider: Arc<dyn MarketDataProvider>,
) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = write_actor::spawn_writer((*pool).clone());
    tracing::info!("Price store at {}", db_path);

    let (queue_pool, queue_writer) = if config.queue_db_path == config.db_path {
        (pool.clone(), writer.clone())
    } else {
        let queue_path = db::init(&config.queue_db_path)?;
        let queue_pool = db::create_pool(&queue_path)?;
        db::run_migrations(&queue_pool)?;
        let queue_writer = write_actor::spawn_writer((*queue_pool).clone());
        tracing::info!("Job queue at {}", queue_path);
        (queue_pool, queue_writer)
    };

    let price_store: Arc<dyn PriceStore> = Arc::new(PriceRepository::new(pool, writer));
    let queue: Arc<dyn JobQueue> = Arc::new(
        JobQueueRepository::new(queue_pool, queue_writer)
            .with_visibility_timeout(config.queue_visibility),
    );
    let fetcher: Arc<dyn PriceFetcherTrait> = Arc::new(
        PriceFetcher::new(provider, price_store.clone())
            .with_provider_timeout(config.provider_timeout),
    );
    let scheduler = Arc::new(Scheduler::new(config.schedule(), queue.clone()));

    Ok(Arc::new(AppState {
        price_store,
        fetcher,
        queue,
        scheduler,
    }))
}
