//! Raw column values and rows as the column store sees them.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A raw column value.
///
/// `Counter` values travel to the store as deltas and come back as the
/// merged total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnValue {
    Text(String),
    Int(i32),
    Long(i64),
    Double(f64),
    Boolean(bool),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
    Bytes(Vec<u8>),
    Counter(i64),
}

impl ColumnValue {
    /// Compares two column values with type-generic semantics.
    ///
    /// Numbers (including timestamps and counters) compare numerically,
    /// text lexicographically, bytes bytewise and booleans as `false < true`.
    /// Values of unrelated families are not comparable.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Bytes(a), Self::Bytes(b)) => Some(a.cmp(b)),
            (Self::Boolean(a), Self::Boolean(b)) => Some(a.cmp(b)),
            (a, b) => match (a.integral(), b.integral()) {
                (Some(x), Some(y)) => Some(x.cmp(&y)),
                _ => {
                    let (x, y) = (a.numeric()?, b.numeric()?);
                    x.partial_cmp(&y)
                }
            },
        }
    }

    /// Returns the value as an exact integer, when it is one.
    #[must_use]
    pub const fn integral(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v as i64),
            Self::Long(v) | Self::Timestamp(v) | Self::Counter(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a float for any numeric kind.
    #[must_use]
    pub fn numeric(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            other => other.integral().map(|v| v as f64),
        }
    }

    /// Short name of the variant, used in error messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Double(_) => "double",
            Self::Boolean(_) => "boolean",
            Self::Timestamp(_) => "timestamp",
            Self::Bytes(_) => "bytes",
            Self::Counter(_) => "counter",
        }
    }
}

/// A storage row: the row key plus whatever columns exist for it.
///
/// There is no fixed schema; a column that was never written is simply
/// missing from `columns`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    pub key: String,
    pub columns: BTreeMap<String, ColumnValue>,
}

impl Row {
    /// Creates an empty row for `key`.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            columns: BTreeMap::new(),
        }
    }

    /// Builder-style column insertion.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: ColumnValue) -> Self {
        self.columns.insert(column.into(), value);
        self
    }

    /// Returns a column value by name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&ColumnValue> {
        self.columns.get(column)
    }

    /// Returns true if the row carries no columns (a deleted-row ghost).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns true if any column name starts with `prefix`.
    #[must_use]
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.columns
            .range(prefix.to_string()..)
            .next()
            .is_some_and(|(name, _)| name.starts_with(prefix))
    }
}
