//! Price bar domain models.

use chrono::{DateTime, Utc};
use quoteflow_market_data::RawBar;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A persisted daily observation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBar {
    pub id: i64,
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    pub volume: Option<i64>,
    pub source: String,
    /// Set once at ingestion, never updated
    pub created_at: DateTime<Utc>,
}

/// A bar waiting to be inserted.
#[derive(Clone, Debug, PartialEq)]
pub struct NewPriceBar {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    pub volume: Option<i64>,
    pub source: String,
}

impl NewPriceBar {
    pub fn from_raw(symbol: &str, source: &str, bar: RawBar) -> Self {
        Self {
            symbol: symbol.to_string(),
            timestamp: bar.timestamp,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            source: source.to_string(),
        }
    }
}

/// Result of a single insert attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A row with the same (symbol, timestamp) already existed; nothing was written.
    Duplicate,
}

/// Summary of one fetch-and-store run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchOutcome {
    pub symbol: String,
    /// Bars returned by the provider
    pub fetched: usize,
    /// Bars newly persisted
    pub inserted: usize,
    pub duplicates: usize,
    /// Bars skipped for lacking a close
    pub skipped: usize,
}

impl FetchOutcome {
    pub fn empty(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            ..Default::default()
        }
    }
}
