//! Typed property values.
//!
//! [`Value`] is what entity properties hold in memory. It is a closed tagged
//! union so the generic serialized column kind can encode any value without
//! knowing its shape in advance (see [`crate::payload`]).

use crate::{EntityId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A typed property value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    /// No value. Never written to the store.
    #[default]
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(Timestamp),
    /// Heterogeneous ordered list.
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Creates a value holding an enumeration's symbolic name.
    pub fn from_enum<E: ColumnEnum>(value: &E) -> Self {
        Self::Text(value.name().to_string())
    }

    /// Returns true for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the string slice if this is a text value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as `i64` for integer values.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v as i64),
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as `f64` for any numeric value.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(f64::from(*v)),
            Self::Long(v) => Some(*v as f64),
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Converts a text value to the enumeration variant of the same name.
    #[must_use]
    pub fn as_enum<E: ColumnEnum>(&self) -> Option<E> {
        self.as_str().and_then(E::from_name)
    }

    /// Short name of the variant, used in error messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Double(_) => "double",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Timestamp(_) => "timestamp",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }
}

/// A Rust enum that is stored by its symbolic name.
///
/// ```ignore
/// enum Status { Active, Retired }
///
/// impl ColumnEnum for Status {
///     fn variants() -> &'static [&'static str] { &["Active", "Retired"] }
///     fn name(&self) -> &'static str { match self { Self::Active => "Active", Self::Retired => "Retired" } }
///     fn from_name(name: &str) -> Option<Self> { /* ... */ }
/// }
/// ```
pub trait ColumnEnum: Sized {
    /// All symbolic names, in declaration order.
    fn variants() -> &'static [&'static str];

    /// The symbolic name of this variant.
    fn name(&self) -> &'static str;

    /// Looks a variant up by its symbolic name.
    fn from_name(name: &str) -> Option<Self>;
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<Timestamp> for Value {
    fn from(v: Timestamp) -> Self {
        Self::Timestamp(v)
    }
}

/// Ids are carried as their row key.
impl From<EntityId> for Value {
    fn from(v: EntityId) -> Self {
        Self::Text(v.to_key())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
