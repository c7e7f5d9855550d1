//! Error types for mapping registration.

use thiserror::Error;

/// Raised while building a [`Registry`](crate::Registry). Mapping errors
/// are configuration mistakes and are fatal at startup.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("entity '{0}' declares no id property")]
    MissingId(String),

    #[error("invalid named query '{name}': {reason}")]
    InvalidNamedQuery { name: String, reason: String },

    #[error("named query '{0}' is declared more than once")]
    DuplicateNamedQuery(String),

    #[error("embedded values form a cycle: {0}")]
    EmbeddedCycle(String),

    #[error("'{owner}.{property}' targets '{target}', which is not a registered {expected}")]
    UnknownTarget {
        owner: String,
        property: String,
        target: String,
        expected: &'static str,
    },

    #[error("type '{0}' is registered more than once")]
    DuplicateType(String),

    #[error("'{owner}' maps more than one property to column '{column}'")]
    DuplicateColumn { owner: String, column: String },

    #[error("invalid counter mapping on '{entity_type}': {reason}")]
    InvalidCounter { entity_type: String, reason: String },

    #[error("invalid embedded mapping on '{owner}': {reason}")]
    InvalidEmbeddable { owner: String, reason: String },

    #[error("schema document error: {0}")]
    Schema(#[from] serde_json::Error),
}

/// Result type for registry operations.
pub type MappingResult<T> = Result<T, MappingError>;
