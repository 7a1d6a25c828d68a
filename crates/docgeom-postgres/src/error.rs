//! Error types for PostgreSQL storage

use docgeom_core::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PostgresError {
    #[error("Failed to connect to {target}: {source}")]
    Connection {
        target: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("PostgreSQL error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

pub type PostgresResult<T> = Result<T, PostgresError>;

impl From<StorageError> for PostgresError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidIdentifier(name) => Self::InvalidIdentifier(name),
            other => Self::Transaction(other.to_string()),
        }
    }
}

impl From<PostgresError> for StorageError {
    fn from(err: PostgresError) -> Self {
        match err {
            PostgresError::Connection { .. } => Self::Connection(err.to_string()),
            PostgresError::InvalidIdentifier(name) => Self::InvalidIdentifier(name),
            PostgresError::Transaction(msg) => Self::Transaction(msg),
            PostgresError::Sqlx(e) => Self::Query(e.to_string()),
        }
    }
}
