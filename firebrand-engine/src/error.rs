//! Error types for the persistence engine.

use firebrand_codec::CodecError;
use firebrand_cql::CqlError;
use firebrand_model::MappingError;
use firebrand_query::QueryError;
use firebrand_storage::StorageError;
use firebrand_types::EntityId;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by the entity factory and entity handles.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("mapping error: {0}")]
    Mapping(#[from] MappingError),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("query error: {0}")]
    Query(#[from] QueryError),

    #[error("statement error: {0}")]
    Cql(#[from] CqlError),

    /// Failure reported by the column store, passed through unchanged.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("entity type '{0}' is not registered")]
    UnknownEntity(String),

    #[error("'{entity_type}' has no mapped property '{property}'")]
    UnknownProperty {
        entity_type: String,
        property: String,
    },

    /// A property holds a different kind of member than the accessor
    /// expects, e.g. a reference read as a scalar value.
    #[error("'{property}' on '{entity_type}' is not a {expected}")]
    MemberKind {
        entity_type: String,
        property: String,
        expected: &'static str,
    },

    #[error("'{0}' instance has never been persisted")]
    NotPersisted(String),

    #[error("'{entity_type}' already has id {id}")]
    IdImmutable { entity_type: String, id: EntityId },

    #[error("expected at most one row, got {0}")]
    NonUniqueResult(usize),

    #[error("unexpected result: {0}")]
    UnexpectedResult(String),

    /// A pre-persist listener vetoed the write.
    #[error("persist of '{entity_type}' rejected: {reason}")]
    Rejected { entity_type: String, reason: String },

    #[error("row key '{key}' is not an entity id: {reason}")]
    InvalidKey { key: String, reason: String },
}
