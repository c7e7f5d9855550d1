use firebrand_types::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

static NULL: Value = Value::Null;

/// An embedded value object.
///
/// Embedded values have no identity: they are stored inline in the owner's
/// row and compare structurally. Missing properties read as [`Value::Null`],
/// so an explicit `Null` and an unset property are equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedded {
    pub embeddable_type: String,
    pub values: BTreeMap<String, Value>,
    pub nested: BTreeMap<String, Option<Embedded>>,
}

impl Embedded {
    pub fn new(embeddable_type: &str) -> Self {
        Self {
            embeddable_type: embeddable_type.into(),
            values: BTreeMap::new(),
            nested: BTreeMap::new(),
        }
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, property: &str, value: impl Into<Value>) -> Self {
        self.set(property, value);
        self
    }

    /// Builder-style [`set_nested`](Self::set_nested).
    #[must_use]
    pub fn with_nested(mut self, property: &str, nested: Embedded) -> Self {
        self.set_nested(property, Some(nested));
        self
    }

    /// Returns a scalar property, or `Null` when unset.
    #[must_use]
    pub fn get(&self, property: &str) -> &Value {
        self.values.get(property).unwrap_or(&NULL)
    }

    pub fn get_str(&self, property: &str) -> Option<&str> {
        self.get(property).as_str()
    }

    pub fn set(&mut self, property: &str, value: impl Into<Value>) {
        self.values.insert(property.into(), value.into());
    }

    /// Returns a nested embedded value, if present.
    #[must_use]
    pub fn nested(&self, property: &str) -> Option<&Embedded> {
        self.nested.get(property).and_then(Option::as_ref)
    }

    pub fn nested_mut(&mut self, property: &str) -> Option<&mut Embedded> {
        self.nested.get_mut(property).and_then(Option::as_mut)
    }

    pub fn set_nested(&mut self, property: &str, nested: Option<Embedded>) {
        self.nested.insert(property.into(), nested);
    }

    fn present_values(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter().filter(|(_, v)| !v.is_null())
    }

    fn present_nested(&self) -> impl Iterator<Item = (&String, &Embedded)> {
        self.nested
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|e| (k, e)))
    }
}

impl PartialEq for Embedded {
    fn eq(&self, other: &Self) -> bool {
        self.embeddable_type == other.embeddable_type
            && self.present_values().eq(other.present_values())
            && self.present_nested().eq(other.present_nested())
    }
}
