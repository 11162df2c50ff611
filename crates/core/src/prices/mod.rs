//! Daily price bars: domain model, storage trait and the fetch-and-store service.
//!
//! ```text
//! Worker / HTTP trigger → PriceFetcher → MarketDataProvider (market-data crate)
//!                              ↓
//!                         PriceStore (DB)
//! ```
//!
//! The store's `(symbol, timestamp)` unique constraint is the only
//! deduplication mechanism. The fetcher inserts bar by bar and treats a
//! constraint hit as "already stored".

pub mod fetcher;
pub mod model;
pub mod store;

#[cfg(test)]
mod fetcher_tests;

pub use fetcher::{PriceFetcher, PriceFetcherTrait};
pub use model::{FetchOutcome, InsertOutcome, NewPriceBar, PriceBar};
pub use store::PriceStore;
