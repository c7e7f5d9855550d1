//! Self-describing binary payloads for generic serialized columns.
//!
//! A payload is the CBOR encoding of the [`Value`] tagged union. Each node
//! carries its own variant tag, so decoding needs no knowledge of the
//! payload's shape and `Int(2)` stays distinct from `Long(2)`.

use crate::{Result, Value};

/// Encodes a value into a payload.
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    Ok(serde_cbor::to_vec(value)?)
}

/// Decodes a payload produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<Value> {
    Ok(serde_cbor::from_slice(bytes)?)
}
