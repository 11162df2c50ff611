//! SQLite storage for quoteflow.
//!
//! The only crate with Diesel in its dependency tree. It implements the
//! `PriceStore` and `JobQueue` traits from `quoteflow-core`:
//! - connection pooling, pragmas and embedded migrations
//! - a single writer actor that serializes every mutation
//! - the `price_bars` table, unique on `(symbol, timestamp)`
//! - the `fetch_jobs` table backing the durable work queue
//!
//! ```text
//!   core (traits)
//!        │
//!        ▼
//!   storage-sqlite ──► writer actor ──► SQLite (WAL)
//! ```

pub mod db;
pub mod errors;
pub mod jobs;
pub mod prices;
pub mod schema;
pub mod utils;

pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};
pub use errors::StorageError;
pub use jobs::JobQueueRepository;
pub use prices::PriceRepository;
