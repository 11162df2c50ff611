//! Quoteflow Core - Domain entities, services, and traits.
//!
//! This crate contains the ingestion pipeline's business logic: the
//! fetch-and-store service, the job queue contract with its worker pool, and
//! the daily scheduler. It is database-agnostic and defines traits that are
//! implemented by the `storage-sqlite` crate.
//!
//! ```text
//! Scheduler → JobQueue → WorkerPool → PriceFetcher → PriceStore
//!                                          ↑
//!                               synchronous trigger
//! ```

pub mod constants;
pub mod errors;
pub mod jobs;
pub mod prices;
pub mod scheduler;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
