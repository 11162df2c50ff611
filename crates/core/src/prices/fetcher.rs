//! Fetch-and-store: the single idempotent write path into the price store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use log::{debug, info};
use quoteflow_market_data::{MarketDataError, MarketDataProvider};

use super::model::{FetchOutcome, InsertOutcome, NewPriceBar};
use super::store::PriceStore;
use crate::constants::default_history_start;
use crate::errors::{Result, ValidationError};

/// Upper bound on a single provider call unless configured otherwise.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait PriceFetcherTrait: Send + Sync {
    /// Fetch `symbol` over `[start, end]` and persist every bar not already stored.
    ///
    /// `start` defaults to the fixed history start, `end` to now. Both dates
    /// are inclusive.
    async fn fetch_and_store(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<FetchOutcome>;

    /// On-demand refresh over the default window. Returns the inserted count.
    async fn fetch_now(&self, symbol: &str) -> Result<usize> {
        Ok(self.fetch_and_store(symbol, None, None).await?.inserted)
    }
}

pub struct PriceFetcher {
    provider: Arc<dyn MarketDataProvider>,
    store: Arc<dyn PriceStore>,
    provider_timeout: Duration,
}

impl PriceFetcher {
    pub fn new(provider: Arc<dyn MarketDataProvider>, store: Arc<dyn PriceStore>) -> Self {
        Self {
            provider,
            store,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    async fn call_provider(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<quoteflow_market_data::RawBar>> {
        let call = self.provider.fetch_series(symbol, start, end);
        match tokio::time::timeout(self.provider_timeout, call).await {
            Err(_) => Err(MarketDataError::Timeout {
                provider: self.provider.id().to_string(),
            }
            .into()),
            Ok(Err(e)) if e.is_empty_series() => Ok(Vec::new()),
            Ok(Err(e)) => Err(e.into()),
            Ok(Ok(bars)) => Ok(bars),
        }
    }
}

#[async_trait]
impl PriceFetcherTrait for PriceFetcher {
    async fn fetch_and_store(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<FetchOutcome> {
        let symbol = normalize_symbol(symbol)?;
        let (from, to) = resolve_window(start, end, Utc::now())?;

        let bars = self.call_provider(&symbol, from, to).await?;
        let mut outcome = FetchOutcome::empty(&symbol);
        if bars.is_empty() {
            info!(
                "No data for {} between {} and {}",
                symbol,
                from.format("%Y-%m-%d"),
                to.format("%Y-%m-%d")
            );
            return Ok(outcome);
        }
        outcome.fetched = bars.len();

        let source = self.provider.id();
        for raw in bars {
            if !raw.has_close() {
                outcome.skipped += 1;
                continue;
            }
            let bar = NewPriceBar::from_raw(&symbol, source, raw);
            match self.store.insert_bar(&bar).await? {
                InsertOutcome::Inserted => outcome.inserted += 1,
                InsertOutcome::Duplicate => {
                    debug!("{} at {} already stored", symbol, bar.timestamp);
                    outcome.duplicates += 1;
                }
            }
        }

        info!(
            "Fetched {} bar(s) for {}: {} inserted, {} already stored, {} skipped",
            outcome.fetched, symbol, outcome.inserted, outcome.duplicates, outcome.skipped
        );
        Ok(outcome)
    }
}

/// Trimmed, non-empty symbol.
pub fn normalize_symbol(symbol: &str) -> Result<String> {
    let trimmed = symbol.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField("symbol".to_string()).into());
    }
    Ok(trimmed.to_string())
}

/// Turns optional inclusive dates into a half-open UTC instant range.
pub fn resolve_window(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let from = start
        .unwrap_or_else(default_history_start)
        .and_time(NaiveTime::MIN)
        .and_utc();
    let to = match end {
        Some(date) => date
            .checked_add_days(Days::new(1))
            .unwrap_or(date)
            .and_time(NaiveTime::MIN)
            .and_utc(),
        None => now,
    };
    if from >= to {
        return Err(ValidationError::InvalidInput(format!(
            "start {} is not before end {}",
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        ))
        .into());
    }
    Ok((from, to))
}
