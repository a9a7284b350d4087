//! Common error types for SentiShift

use thiserror::Error;

/// Common result type for SentiShift operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across SentiShift services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding error for stored JSON columns
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether retrying the same operation may succeed.
    ///
    /// Lock contention, pool exhaustion and dropped connections are transient;
    /// constraint violations, bad SQL and decoding failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Database(err) => match err {
                sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::WorkerCrashed => true,
                sqlx::Error::Database(db_err) => {
                    let msg = db_err.message();
                    msg.contains("database is locked") || msg.contains("database table is locked")
                }
                _ => false,
            },
            Error::Io(_) => true,
            _ => false,
        }
    }
}
