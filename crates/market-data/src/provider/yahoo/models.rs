//! Yahoo Finance chart API response models.
//!
//! Indicator cells are kept as raw JSON values so they can go through
//! [`crate::normalize`] instead of trusting the wire shape.

use serde::Deserialize;
use serde_json::Value;

/// Main response wrapper for the v8 chart API
#[derive(Debug, Deserialize)]
pub struct YahooChartResponse {
    pub chart: YahooChart,
}

#[derive(Debug, Deserialize)]
pub struct YahooChart {
    #[serde(default)]
    pub result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    pub error: Option<YahooChartError>,
}

#[derive(Debug, Deserialize)]
pub struct YahooChartError {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Individual result from the chart API
#[derive(Debug, Deserialize)]
pub struct YahooChartResult {
    #[serde(default)]
    pub meta: Option<YahooChartMeta>,
    #[serde(default)]
    pub timestamp: Option<Vec<i64>>,
    pub indicators: YahooIndicators,
}

/// Only the exchange offset is read; it anchors bars to their trading date.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooChartMeta {
    #[serde(default)]
    pub gmtoffset: Option<i64>,
    #[serde(default)]
    pub exchange_timezone_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct YahooIndicators {
    #[serde(default)]
    pub quote: Vec<YahooQuoteIndicator>,
}

/// Parallel OHLCV columns, one cell per timestamp
#[derive(Debug, Default, Deserialize)]
pub struct YahooQuoteIndicator {
    #[serde(default)]
    pub open: Vec<Value>,
    #[serde(default)]
    pub high: Vec<Value>,
    #[serde(default)]
    pub low: Vec<Value>,
    #[serde(default)]
    pub close: Vec<Value>,
    #[serde(default)]
    pub volume: Vec<Value>,
}
