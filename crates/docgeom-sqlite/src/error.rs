//! Error types for SQLite storage

use docgeom_core::StorageError;
use thiserror::Error;

/// SQLite storage error type
#[derive(Error, Debug)]
pub enum SqliteError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Schema/migration error
    #[error("Schema error: {0}")]
    Schema(String),

    /// Identifier that cannot be quoted
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Blocking task panicked or was cancelled
    #[error("Task error: {0}")]
    Task(String),

    /// Underlying rusqlite error
    #[error("SQLite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
}

/// Result type for SQLite operations
pub type SqliteResult<T> = Result<T, SqliteError>;

impl From<StorageError> for SqliteError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidIdentifier(name) => Self::InvalidIdentifier(name),
            other => Self::Schema(other.to_string()),
        }
    }
}

impl From<SqliteError> for StorageError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::Connection(msg) => Self::Connection(msg),
            SqliteError::Schema(msg) => Self::Schema(msg),
            SqliteError::InvalidIdentifier(name) => Self::InvalidIdentifier(name),
            SqliteError::Task(msg) => Self::Backend(msg),
            SqliteError::Rusqlite(e) => Self::Query(e.to_string()),
        }
    }
}
