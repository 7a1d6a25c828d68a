//! Storage error types shared by every backend

use thiserror::Error;

/// Errors surfaced through the store traits
#[derive(Error, Debug, Clone)]
pub enum StorageError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    pub fn backend<S: Into<String>>(msg: S) -> Self {
        Self::Backend(msg.into())
    }

    pub fn query<S: Into<String>>(msg: S) -> Self {
        Self::Query(msg.into())
    }

    pub fn deserialization<S: Into<String>>(msg: S) -> Self {
        Self::Deserialization(msg.into())
    }
}
