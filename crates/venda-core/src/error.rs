//! Error types shared across venda crates.

use thiserror::Error;

/// Result alias using venda errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for store, dispatch, and delivery failures.
///
/// The worker records handler failures verbatim via `to_string()`, so
/// display messages double as the `error_message` column's contents.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A referenced record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Stock level too low to satisfy a decrement.
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        available: i64,
        requested: i64,
    },

    /// Job queue operation failed.
    #[error("Job error: {0}")]
    Job(String),

    /// JSON (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller-supplied data failed validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Outbound HTTP request failed.
    #[error("Request error: {0}")]
    Request(String),

    /// I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal invariant violated.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Request(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = Error::NotFound("product 42".to_string());
        assert_eq!(err.to_string(), "Not found: product 42");

        let err = Error::Job("queue unavailable".to_string());
        assert_eq!(err.to_string(), "Job error: queue unavailable");

        let err = Error::InvalidInput("quantity must be positive".to_string());
        assert_eq!(err.to_string(), "Invalid input: quantity must be positive");
    }

    #[test]
    fn insufficient_stock_names_the_gap() {
        let err = Error::InsufficientStock {
            product_id: 7,
            available: 2,
            requested: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains("product 7"));
        assert!(msg.contains("available 2"));
        assert!(msg.contains("requested 5"));
    }

    #[test]
    fn serde_json_error_converts_to_serialization() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
        assert!(err.to_string().starts_with("Serialization error:"));
    }

    #[test]
    fn sqlx_error_converts_to_database() {
        let err: Error = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, Error::Database(_)));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
