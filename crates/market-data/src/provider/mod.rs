//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - The `MarketDataProvider` trait that all providers implement
//! - Concrete provider implementations (Yahoo)
//!
//! The ingestion pipeline only knows about the trait; which provider backs a
//! deployment is decided when the application state is built.

mod traits;

pub mod yahoo;

// Re-exports
pub use traits::MarketDataProvider;
