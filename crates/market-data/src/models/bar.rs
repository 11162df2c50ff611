use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One daily observation as returned by a provider, after scalar normalization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    /// Start of the trading period, UTC
    pub timestamp: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<Decimal>,

    /// Closing price. Providers drop rows without one.
    pub close: Option<Decimal>,

    /// Traded units, never negative
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<i64>,
}

impl RawBar {
    /// Create a bar carrying only a close price
    pub fn with_close(timestamp: DateTime<Utc>, close: Decimal) -> Self {
        Self {
            timestamp,
            open: None,
            high: None,
            low: None,
            close: Some(close),
            volume: None,
        }
    }

    pub fn has_close(&self) -> bool {
        self.close.is_some()
    }
}
