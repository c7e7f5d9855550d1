//! Reference and collection columns.
//!
//! A reference is stored as the target's row key; a collection as a generic
//! payload holding the ordered list of keys.

use crate::{CodecError, CodecResult};
use firebrand_types::{ColumnValue, EntityId, Value, payload};

pub fn encode_reference(id: &EntityId) -> ColumnValue {
    ColumnValue::Text(id.to_key())
}

/// Decodes a reference column. An absent column is no reference.
pub fn decode_reference(raw: Option<&ColumnValue>, property: &str) -> CodecResult<Option<EntityId>> {
    match raw {
        None => Ok(None),
        Some(ColumnValue::Text(key)) => parse_id(key, property).map(Some),
        Some(other) => Err(CodecError::TypeMismatch {
            property: property.to_string(),
            expected: "reference",
            found: other.kind_name(),
        }),
    }
}

pub fn encode_collection(ids: &[EntityId]) -> CodecResult<ColumnValue> {
    let keys = ids.iter().map(|id| Value::Text(id.to_key())).collect();
    Ok(ColumnValue::Bytes(payload::encode(&Value::List(keys))?))
}

/// Decodes a collection column, preserving order. An absent column is an
/// empty collection.
pub fn decode_collection(raw: Option<&ColumnValue>, property: &str) -> CodecResult<Vec<EntityId>> {
    let bytes = match raw {
        None => return Ok(Vec::new()),
        Some(ColumnValue::Bytes(bytes)) => bytes,
        Some(other) => {
            return Err(CodecError::TypeMismatch {
                property: property.to_string(),
                expected: "collection",
                found: other.kind_name(),
            });
        }
    };
    let Value::List(items) = payload::decode(bytes)? else {
        return Err(invalid(property, "collection payload is not a list"));
    };
    items
        .iter()
        .map(|item| match item {
            Value::Text(key) => parse_id(key, property),
            other => Err(invalid(
                property,
                &format!("collection element is {}", other.kind_name()),
            )),
        })
        .collect()
}

fn parse_id(key: &str, property: &str) -> CodecResult<EntityId> {
    EntityId::parse(key).map_err(|e| invalid(property, &e.to_string()))
}

fn invalid(property: &str, reason: &str) -> CodecError {
    CodecError::InvalidReference {
        property: property.to_string(),
        reason: reason.to_string(),
    }
}
