//! SurrealDB backend errors

use docgeom_core::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SurrealError {
    #[error("Failed to connect to {endpoint}: {message}")]
    Connection { endpoint: String, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Malformed {table} document: {message}")]
    Document { table: String, message: String },
}

pub type SurrealResult<T> = Result<T, SurrealError>;

impl From<SurrealError> for StorageError {
    fn from(err: SurrealError) -> Self {
        match err {
            SurrealError::Connection { .. } | SurrealError::Auth(_) => {
                StorageError::Connection(err.to_string())
            }
            SurrealError::Query(message) => StorageError::Query(message),
            SurrealError::Document { .. } => StorageError::Deserialization(err.to_string()),
        }
    }
}
