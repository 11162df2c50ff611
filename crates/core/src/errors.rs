//! Core error types for quoteflow.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, etc.) are converted to these types by the storage layer.

use chrono::ParseError as ChronoParseError;
use quoteflow_market_data::{MarketDataError, RetryClass};
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the ingestion pipeline.
///
/// Database-specific errors are wrapped in string form to keep this type
/// database-agnostic.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    /// The job queue could not accept or hand out work.
    #[error("Job queue unavailable: {0}")]
    Queue(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    #[error("Job timed out after {0} seconds")]
    JobTimeout(u64),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// Whether a queued job that failed with this error is worth another attempt.
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Error::MarketData(e) => e.retry_class(),
            Error::Database(DatabaseError::UniqueViolation(_)) => RetryClass::Never,
            Error::Database(_) | Error::Queue(_) | Error::JobTimeout(_) => {
                RetryClass::WithBackoff
            }
            Error::Validation(_) | Error::InvalidConfigValue(_) | Error::Unexpected(_) => {
                RetryClass::Never
            }
        }
    }
}

/// Database-agnostic error type for storage operations.
///
/// This enum uses `String` for all error details, allowing the storage layer
/// to convert storage-specific errors (Diesel, SQLite, etc.) into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A unique constraint was violated (e.g., duplicate key).
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// A database transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Validation errors for user input and data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Failed to parse date/time: {0}")]
    DateTimeParse(#[from] ChronoParseError),
}

// === From implementations for common error types ===

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_class_follows_provider_error() {
        let err: Error = MarketDataError::RateLimited {
            provider: "YAHOO".into(),
        }
        .into();
        assert_eq!(err.retry_class(), RetryClass::WithBackoff);

        let err: Error = MarketDataError::SymbolNotFound("ZZZZ".into()).into();
        assert_eq!(err.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_retry_class_for_infrastructure_errors() {
        assert_eq!(
            Error::Queue("broker down".into()).retry_class(),
            RetryClass::WithBackoff
        );
        assert_eq!(Error::JobTimeout(300).retry_class(), RetryClass::WithBackoff);
        assert_eq!(
            Error::Database(DatabaseError::QueryFailed("locked".into())).retry_class(),
            RetryClass::WithBackoff
        );
        assert_eq!(
            Error::Validation(ValidationError::MissingField("symbol".into())).retry_class(),
            RetryClass::Never
        );
    }
}
