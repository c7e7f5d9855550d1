//! Column codec layer.
//!
//! Converts typed property values to raw column values and back, driven by
//! the [`ColumnKind`](firebrand_model::ColumnKind) of each column:
//! - scalar columns ([`encode`], [`decode`], [`literal`])
//! - embedded value objects flattened into namespaced columns
//!   ([`flatten`], [`unflatten`])
//! - references and collections stored as ids ([`encode_reference`],
//!   [`encode_collection`] and their decoders)

mod association;
mod embedded;
mod error;
mod scalar;

pub use association::{decode_collection, decode_reference, encode_collection, encode_reference};
pub use embedded::{flatten, unflatten};
pub use error::{CodecError, CodecResult};
pub use scalar::{decode, encode, literal};
