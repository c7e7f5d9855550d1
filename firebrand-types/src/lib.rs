//! Core type definitions for Firebrand.
//!
//! This crate defines the storage-agnostic types shared by every layer of
//! the mapping engine:
//! - Entity identifiers (UUID v7, doubling as row keys)
//! - Millisecond timestamps
//! - Typed property values ([`Value`]) and raw column values ([`ColumnValue`])
//! - Storage rows and the self-describing payload encoding used for
//!   generic serialized columns

mod column;
mod ids;
pub mod payload;
mod timestamp;
mod value;

pub use column::{ColumnValue, Row};
pub use ids::EntityId;
pub use timestamp::Timestamp;
pub use value::{ColumnEnum, Value};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("payload error: {0}")]
    Payload(#[from] serde_cbor::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
