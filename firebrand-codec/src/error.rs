use thiserror::Error;

/// Errors raised while converting between property and column values.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("'{property}' expects a {expected} value, got {found}")]
    TypeMismatch {
        property: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("'{property}' value {value} does not fit a 32-bit column")]
    OutOfRange { property: String, value: i64 },

    #[error("'{property}' has no enum variant named '{name}'")]
    UnknownVariant { property: String, name: String },

    #[error("'{property}' is not declared on embeddable '{embeddable}'")]
    UndeclaredProperty { embeddable: String, property: String },

    #[error("'{property}' holds a '{found}' value where '{expected}' is mapped")]
    WrongEmbeddable {
        property: String,
        expected: String,
        found: String,
    },

    #[error("embeddable '{0}' is not registered")]
    UnknownEmbeddable(String),

    #[error("'{property}' holds an invalid entity id: {reason}")]
    InvalidReference { property: String, reason: String },

    #[error("payload error: {0}")]
    Payload(#[from] firebrand_types::Error),
}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
