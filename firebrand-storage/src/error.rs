//! Error types for the storage layer.

use firebrand_cql::CqlError;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Statement text the store could not parse or bind.
    #[error("query error: {0}")]
    Query(#[from] CqlError),

    /// Snapshot serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A well-formed statement the store cannot execute.
    #[error("unsupported statement: {0}")]
    Unsupported(String),

    /// Invalid data, e.g. a non-text row key or incrementing a text column.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// The backend is unreachable or rejected the request.
    #[error("backend error: {0}")]
    Backend(String),
}
