//! Yahoo Finance market data provider.
//!
//! Reads daily bars from the public v8 chart endpoint. Works for equities,
//! ETFs, crypto pairs (`BTC-USD`) and FX pairs (`EURUSD=X`) alike.

mod models;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use reqwest::{header, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};
use urlencoding::encode;

use crate::errors::MarketDataError;
use crate::models::RawBar;
use crate::normalize::{self, NormalizeError};
use crate::provider::MarketDataProvider;

use models::{YahooChartResponse, YahooQuoteIndicator};

const PROVIDER_ID: &str = "YAHOO";
const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Yahoo Finance market data provider.
pub struct YahooProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooProvider {
    /// Create a provider whose HTTP requests are bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, MarketDataError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to initialize HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the provider at another host (a proxy or a test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn chart_url(&self, symbol: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
        format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=history",
            self.base_url,
            encode(symbol),
            start.timestamp(),
            end.timestamp()
        )
    }

    fn map_send_error(e: reqwest::Error) -> MarketDataError {
        if e.is_timeout() {
            MarketDataError::Timeout {
                provider: PROVIDER_ID.to_string(),
            }
        } else {
            MarketDataError::Network(e)
        }
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_series(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawBar>, MarketDataError> {
        debug!(
            "Fetching daily bars for {} from {} to {} from Yahoo",
            symbol,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        );

        let response = self
            .client
            .get(self.chart_url(symbol, start, end))
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }
        if !status.is_success() {
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        let body = response.text().await.map_err(Self::map_send_error)?;
        let chart: YahooChartResponse =
            serde_json::from_str(&body).map_err(|e| MarketDataError::MalformedResponse {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to parse chart response: {}", e),
            })?;

        let bars = bars_from_chart(symbol, chart)?;
        if bars.is_empty() {
            warn!(
                "No daily bars returned for '{}' between {} and {}",
                symbol,
                start.format("%Y-%m-%d"),
                end.format("%Y-%m-%d")
            );
        }
        Ok(bars)
    }
}

/// Turn a chart payload into bars.
///
/// A missing result or timestamp column is an empty series. Rows without a
/// close are dropped. Any cell that fails normalization fails the whole call.
fn bars_from_chart(
    symbol: &str,
    response: YahooChartResponse,
) -> Result<Vec<RawBar>, MarketDataError> {
    let chart = response.chart;
    if let Some(error) = chart.error {
        if error.code.eq_ignore_ascii_case("Not Found") {
            return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
        }
        return Err(MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: format!(
                "{}: {}",
                error.code,
                error.description.unwrap_or_default()
            ),
        });
    }

    let Some(result) = chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(vec![]);
    };
    let timestamps = result.timestamp.unwrap_or_default();
    if timestamps.is_empty() {
        return Ok(vec![]);
    }

    let gmtoffset = result.meta.as_ref().and_then(|m| m.gmtoffset).unwrap_or(0);
    if let Some(tz) = result
        .meta
        .as_ref()
        .and_then(|m| m.exchange_timezone_name.as_deref())
    {
        debug!("Anchoring {} bars to exchange timezone {}", symbol, tz);
    }

    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| malformed("chart result has no quote indicator".to_string()))?;

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.into_iter().enumerate() {
        let bar = bar_at(&quote, i, ts, gmtoffset)?;
        if !bar.has_close() {
            debug!("Skipping {} bar at {} without a close", symbol, bar.timestamp);
            continue;
        }
        bars.push(bar);
    }
    Ok(bars)
}

fn bar_at(
    quote: &YahooQuoteIndicator,
    i: usize,
    ts: i64,
    gmtoffset: i64,
) -> Result<RawBar, MarketDataError> {
    Ok(RawBar {
        timestamp: trading_date(ts, gmtoffset)?,
        open: normalize::scalar_decimal(cell(&quote.open, i)).map_err(|e| field_error("open", i, e))?,
        high: normalize::scalar_decimal(cell(&quote.high, i)).map_err(|e| field_error("high", i, e))?,
        low: normalize::scalar_decimal(cell(&quote.low, i)).map_err(|e| field_error("low", i, e))?,
        close: normalize::scalar_decimal(cell(&quote.close, i))
            .map_err(|e| field_error("close", i, e))?,
        volume: normalize::scalar_volume(cell(&quote.volume, i))
            .map_err(|e| field_error("volume", i, e))?,
    })
}

/// Midnight UTC of the exchange-local trading date.
///
/// Yahoo stamps daily bars with the session open, and the latest bar with the
/// last trade time. Anchoring to the date keeps re-fetches of the same day on
/// the same (symbol, timestamp) key.
fn trading_date(ts: i64, gmtoffset: i64) -> Result<DateTime<Utc>, MarketDataError> {
    let local = Utc
        .timestamp_opt(ts + gmtoffset, 0)
        .single()
        .ok_or_else(|| malformed(format!("invalid timestamp {}", ts)))?;
    Ok(local.date_naive().and_time(NaiveTime::MIN).and_utc())
}

fn cell(column: &[Value], i: usize) -> &Value {
    column.get(i).unwrap_or(&Value::Null)
}

fn field_error(field: &str, i: usize, e: NormalizeError) -> MarketDataError {
    malformed(format!("{}[{}]: {}", field, i, e))
}

fn malformed(message: String) -> MarketDataError {
    MarketDataError::MalformedResponse {
        provider: PROVIDER_ID.to_string(),
        message,
    }
}
