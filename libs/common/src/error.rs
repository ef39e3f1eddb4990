//! Custom error types for the common library
//!
//! This module defines the errors raised by the process store backends.
//! Messages coming back from the hosted backend are kept verbatim so they can
//! be shown to the reviewer as-is.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for process store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend could not be reached
    #[error("Store connection error: {0}")]
    Connection(#[source] reqwest::Error),

    /// The backend answered with an error payload
    #[error("{message}")]
    Backend { status: u16, message: String },

    /// Error occurred during SQL query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// The backend answered with a body we could not understand
    #[error("Malformed store response: {0}")]
    Decode(String),

    /// Configuration error
    #[error("Store configuration error: {0}")]
    Configuration(String),
}

impl From<SqlxError> for StoreError {
    fn from(err: SqlxError) -> Self {
        StoreError::Query(err)
    }
}

/// Type alias for Result with StoreError
pub type StoreResult<T> = Result<T, StoreError>;
