//! Error types for database setup and token handling

use sqlx::Error as SqlxError;
use sqlx::migrate::MigrateError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(#[source] MigrateError),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Errors raised while verifying or loading token material
#[derive(Error, Debug)]
pub enum TokenError {
    /// The signing or verification key is missing or unreadable
    #[error("Token key error: {0}")]
    Key(String),

    /// The token failed signature, expiry or shape validation
    #[error("Invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}
