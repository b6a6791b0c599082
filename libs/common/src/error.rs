//! Error types shared by the Grúa Style services
//!
//! Storage and cache plumbing report failures through these types so that
//! services can decide which ones are fatal at startup.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred while opening the pool
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred while applying migrations
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Missing or malformed deployment settings
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Error type for cache operations
#[derive(Error, Debug)]
pub enum CacheError {
    /// The Redis URL could not be parsed
    #[error("Cache configuration error: {0}")]
    Configuration(#[source] redis::RedisError),

    /// A command failed or the server was unreachable
    #[error("Cache command error: {0}")]
    Command(#[source] redis::RedisError),
}

/// Type alias for Result with CacheError
pub type CacheResult<T> = Result<T, CacheError>;
