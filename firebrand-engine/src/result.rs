//! Conversions from a raw query result to a single typed result.

use crate::factory::unexpected;
use crate::{EngineError, EngineResult, EntityFactory, EntityRef};
use firebrand_storage::QueryResult;
use firebrand_types::{ColumnValue, Timestamp, Value};

/// A type [`EntityFactory::get_single_result`] can return.
pub trait SingleResult: Sized {
    /// Extracts at most one result. `entity_type` is the type rows are
    /// materialized as; scalar results ignore it.
    fn from_result(
        factory: &EntityFactory,
        entity_type: &str,
        result: QueryResult,
    ) -> EngineResult<Option<Self>>;
}

impl SingleResult for EntityRef {
    fn from_result(
        factory: &EntityFactory,
        entity_type: &str,
        result: QueryResult,
    ) -> EngineResult<Option<Self>> {
        let rows = match result {
            QueryResult::Rows(rows) => rows,
            other => return Err(unexpected("rows", &other)),
        };
        let descriptor = factory.descriptor(entity_type)?;
        let mut entities = factory.materialize_rows(descriptor, rows)?;
        match entities.len() {
            0 | 1 => Ok(entities.pop()),
            n => Err(EngineError::NonUniqueResult(n)),
        }
    }
}

impl SingleResult for Value {
    fn from_result(
        _factory: &EntityFactory,
        _entity_type: &str,
        result: QueryResult,
    ) -> EngineResult<Option<Self>> {
        match result {
            QueryResult::Scalar(value) => Ok(Some(scalar_value(value))),
            QueryResult::Void => Ok(None),
            rows @ QueryResult::Rows(_) => Err(unexpected("a scalar", &rows)),
        }
    }
}

impl SingleResult for i64 {
    fn from_result(
        factory: &EntityFactory,
        entity_type: &str,
        result: QueryResult,
    ) -> EngineResult<Option<Self>> {
        match Value::from_result(factory, entity_type, result)? {
            None => Ok(None),
            Some(value) => value.as_i64().map(Some).ok_or_else(|| {
                EngineError::UnexpectedResult(format!(
                    "expected an integer scalar, got {}",
                    value.kind_name()
                ))
            }),
        }
    }
}

/// Converts an aggregate column value without a descriptor.
fn scalar_value(value: ColumnValue) -> Value {
    match value {
        ColumnValue::Text(s) => Value::Text(s),
        ColumnValue::Int(v) => Value::Int(v),
        ColumnValue::Long(v) | ColumnValue::Counter(v) => Value::Long(v),
        ColumnValue::Double(v) => Value::Double(v),
        ColumnValue::Boolean(b) => Value::Boolean(b),
        ColumnValue::Timestamp(ms) => Value::Timestamp(Timestamp::from_millis(ms)),
        ColumnValue::Bytes(b) => Value::Bytes(b),
    }
}
