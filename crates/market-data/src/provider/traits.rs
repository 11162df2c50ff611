//! Market data provider trait definitions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::MarketDataError;
use crate::models::RawBar;

/// Trait for market data providers.
///
/// Implement this trait to add support for a new market data source.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use quoteflow_market_data::{MarketDataProvider, MarketDataError, RawBar};
///
/// struct MyProvider;
///
/// #[async_trait]
/// impl MarketDataProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     async fn fetch_series(
///         &self,
///         symbol: &str,
///         start: DateTime<Utc>,
///         end: DateTime<Utc>,
///     ) -> Result<Vec<RawBar>, MarketDataError> {
///         Ok(vec![])
///     }
/// }
/// ```
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "YAHOO". Stored as the `source` tag
    /// of every bar persisted from this provider.
    fn id(&self) -> &'static str;

    /// Fetch daily bars for a symbol.
    ///
    /// # Arguments
    ///
    /// * `symbol` - Provider symbol, already trimmed
    /// * `start` - Start of the date range (inclusive)
    /// * `end` - End of the date range (exclusive)
    ///
    /// # Returns
    ///
    /// Bars ordered by timestamp ascending. An empty vector (or
    /// [`MarketDataError::NoDataForRange`]) means the symbol has no data in range.
    async fn fetch_series(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawBar>, MarketDataError>;
}
