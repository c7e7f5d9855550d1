//! Error types for query compilation.

use firebrand_codec::CodecError;
use firebrand_cql::CqlError;
use thiserror::Error;

/// Result type for query compilation.
pub type CompileResult<T> = Result<T, QueryError>;

/// A query descriptor that cannot be compiled.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("unknown entity type: {0}")]
    UnknownType(String),

    #[error("'{entity_type}' has no property '{property}'")]
    UnknownProperty {
        entity_type: String,
        property: String,
    },

    #[error("'{entity_type}.{property}' is not indexed")]
    NotIndexed {
        entity_type: String,
        property: String,
    },

    #[error("'{entity_type}.{property}' is an association and cannot be used here")]
    AssociationMember {
        entity_type: String,
        property: String,
    },

    #[error("null value for '{0}'")]
    NullValue(String),

    #[error("key set is empty")]
    EmptyKeySet,

    #[error("limit must be positive")]
    InvalidLimit,

    #[error("a key range and a start key cannot be combined")]
    ConflictingKeyBounds,

    #[error("update assigns no columns")]
    EmptyUpdate,

    #[error("'{0}' is not a counter column")]
    NotCounter(String),

    #[error("unknown named query: {0}")]
    UnknownNamedQuery(String),

    #[error("named query '{query}' needs parameter '{parameter}'")]
    MissingParameter { query: String, parameter: String },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Cql(#[from] CqlError),
}
