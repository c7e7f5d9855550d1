use crate::{CodecError, CodecResult};
use firebrand_model::{ColumnDescriptor, ColumnKind};
use firebrand_types::{ColumnValue, Timestamp, Value, payload};

/// Encodes a property value for `column`.
///
/// Returns `None` for [`Value::Null`]: nulls are never written. Integers
/// widen to longs and doubles; a long narrows to an int column only when it
/// fits.
pub fn encode(value: &Value, column: &ColumnDescriptor) -> CodecResult<Option<ColumnValue>> {
    let encoded = match (&column.kind, value) {
        (_, Value::Null) => return Ok(None),
        (ColumnKind::Serialized, v) => ColumnValue::Bytes(payload::encode(v)?),
        (ColumnKind::Text, Value::Text(s)) => ColumnValue::Text(s.clone()),
        (ColumnKind::Int, Value::Int(v)) => ColumnValue::Int(*v),
        (ColumnKind::Int, Value::Long(v)) => ColumnValue::Int(narrow(column, *v)?),
        (ColumnKind::Long, Value::Int(v)) => ColumnValue::Long(i64::from(*v)),
        (ColumnKind::Long, Value::Long(v)) => ColumnValue::Long(*v),
        (ColumnKind::Double, Value::Int(v)) => ColumnValue::Double(f64::from(*v)),
        (ColumnKind::Double, Value::Long(v)) => ColumnValue::Double(*v as f64),
        (ColumnKind::Double, Value::Double(v)) => ColumnValue::Double(*v),
        (ColumnKind::Boolean, Value::Boolean(b)) => ColumnValue::Boolean(*b),
        (ColumnKind::Timestamp, Value::Timestamp(ts)) => ColumnValue::Timestamp(ts.as_millis()),
        (ColumnKind::Bytes, Value::Bytes(b)) => ColumnValue::Bytes(b.clone()),
        (ColumnKind::Enum { variants }, Value::Text(name)) => {
            check_variant(column, variants, name)?;
            ColumnValue::Text(name.clone())
        }
        (ColumnKind::Counter { .. }, Value::Int(v)) => ColumnValue::Counter(i64::from(*v)),
        (ColumnKind::Counter { .. }, Value::Long(v)) => ColumnValue::Counter(*v),
        (kind, v) => return Err(mismatch(column, kind.name(), v.kind_name())),
    };
    Ok(Some(encoded))
}

/// Decodes a stored column for `column`. An absent column decodes to
/// [`Value::Null`].
///
/// Integer raw values are accepted for timestamp columns, since native
/// updates write plain numbers.
pub fn decode(raw: Option<&ColumnValue>, column: &ColumnDescriptor) -> CodecResult<Value> {
    let Some(raw) = raw else {
        return Ok(Value::Null);
    };
    let decoded = match (&column.kind, raw) {
        (ColumnKind::Text, ColumnValue::Text(s)) => Value::Text(s.clone()),
        (ColumnKind::Int, r) => Value::Int(narrow(column, integral(column, r)?)?),
        (ColumnKind::Long | ColumnKind::Counter { .. }, r) => Value::Long(integral(column, r)?),
        (ColumnKind::Double, r) => Value::Double(
            r.numeric()
                .ok_or_else(|| mismatch(column, "double", r.kind_name()))?,
        ),
        (ColumnKind::Boolean, ColumnValue::Boolean(b)) => Value::Boolean(*b),
        (ColumnKind::Timestamp, r) => {
            Value::Timestamp(Timestamp::from_millis(integral(column, r)?))
        }
        (ColumnKind::Bytes, ColumnValue::Bytes(b)) => Value::Bytes(b.clone()),
        (ColumnKind::Enum { variants }, ColumnValue::Text(name)) => {
            check_variant(column, variants, name)?;
            Value::Text(name.clone())
        }
        (ColumnKind::Serialized, ColumnValue::Bytes(b)) => payload::decode(b)?,
        (kind, r) => return Err(mismatch(column, kind.name(), r.kind_name())),
    };
    Ok(decoded)
}

/// Converts a value to a column value without a descriptor.
///
/// Used for raw query targets and named query parameters. Lists and maps
/// become generic payloads; `Null` has no literal form.
pub fn literal(value: &Value) -> CodecResult<Option<ColumnValue>> {
    Ok(Some(match value {
        Value::Null => return Ok(None),
        Value::Boolean(b) => ColumnValue::Boolean(*b),
        Value::Int(v) => ColumnValue::Int(*v),
        Value::Long(v) => ColumnValue::Long(*v),
        Value::Double(v) => ColumnValue::Double(*v),
        Value::Text(s) => ColumnValue::Text(s.clone()),
        Value::Bytes(b) => ColumnValue::Bytes(b.clone()),
        Value::Timestamp(ts) => ColumnValue::Timestamp(ts.as_millis()),
        v @ (Value::List(_) | Value::Map(_)) => ColumnValue::Bytes(payload::encode(v)?),
    }))
}

fn check_variant(column: &ColumnDescriptor, variants: &[String], name: &str) -> CodecResult<()> {
    if variants.iter().any(|v| v == name) {
        Ok(())
    } else {
        Err(CodecError::UnknownVariant {
            property: column.property.clone(),
            name: name.to_string(),
        })
    }
}

fn integral(column: &ColumnDescriptor, raw: &ColumnValue) -> CodecResult<i64> {
    raw.integral()
        .ok_or_else(|| mismatch(column, column.kind.name(), raw.kind_name()))
}

fn narrow(column: &ColumnDescriptor, value: i64) -> CodecResult<i32> {
    i32::try_from(value).map_err(|_| CodecError::OutOfRange {
        property: column.property.clone(),
        value,
    })
}

fn mismatch(column: &ColumnDescriptor, expected: &'static str, found: &'static str) -> CodecError {
    CodecError::TypeMismatch {
        property: column.property.clone(),
        expected,
        found,
    }
}
