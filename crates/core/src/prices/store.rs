//! Price storage traits.
//!
//! Writes are one transaction per bar so a conflicting row never holds a lock
//! that blocks its siblings. Reads are plain synchronous queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{InsertOutcome, NewPriceBar, PriceBar};
use crate::errors::Result;

/// Storage interface for daily price bars.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Inserts one bar in its own transaction.
    ///
    /// A uniqueness violation on `(symbol, timestamp)` rolls that transaction
    /// back and returns [`InsertOutcome::Duplicate`]. It is never an error.
    async fn insert_bar(&self, bar: &NewPriceBar) -> Result<InsertOutcome>;

    /// Bars for `symbol` with `start <= timestamp <= end`, ascending by timestamp.
    fn range(&self, symbol: &str, start: DateTime<Utc>, end: DateTime<Utc>)
        -> Result<Vec<PriceBar>>;

    /// Number of stored bars for `symbol`.
    fn count(&self, symbol: &str) -> Result<usize>;

    /// Round trip to the backing store, for readiness checks.
    fn ping(&self) -> Result<()> {
        Ok(())
    }
}
