//! Quoteflow Market Data Crate
//!
//! Provider-agnostic retrieval of daily price series for the quoteflow
//! ingestion pipeline.
//!
//! # Overview
//!
//! ```text
//! +------------------+     +------------------+     +------------------+
//! |  PriceFetcher    | --> | MarketDataProvider| --> |  Provider API    |
//! |  (core crate)    |     |  (Yahoo, ...)     |     |  (HTTP / JSON)   |
//! +------------------+     +------------------+     +------------------+
//!                                   |
//!                                   v
//!                          +------------------+
//!                          |    normalize     |  (scalar coercion)
//!                          +------------------+
//!                                   |
//!                                   v
//!                          +------------------+
//!                          |     RawBar       |
//!                          +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`MarketDataProvider`] - Trait every data source implements
//! - [`RawBar`] - One provider observation with normalized numeric fields
//! - [`MarketDataError`] - Provider failures, classified by [`RetryClass`]

pub mod errors;
pub mod models;
pub mod normalize;
pub mod provider;

pub use errors::{MarketDataError, RetryClass};
pub use models::RawBar;
pub use normalize::NormalizeError;
pub use provider::yahoo::YahooProvider;
pub use provider::MarketDataProvider;
