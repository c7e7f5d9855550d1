use firebrand_types::Value;

/// A filter on rows of a select.
///
/// Range comparisons are type-generic: text compares lexicographically,
/// timestamps chronologically and numbers numerically.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        property: String,
        comparison: Comparison,
        value: Value,
    },
    /// Inclusive on both ends.
    Between {
        property: String,
        low: Value,
        high: Value,
    },
    /// Rows whose key is one of `keys`.
    KeyIn(Vec<String>),
    /// Rows whose discriminator names `entity_type`.
    OfType(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Predicate {
    fn compare(property: &str, comparison: Comparison, value: impl Into<Value>) -> Self {
        Self::Compare {
            property: property.into(),
            comparison,
            value: value.into(),
        }
    }

    pub fn eq(property: &str, value: impl Into<Value>) -> Self {
        Self::compare(property, Comparison::Eq, value)
    }

    pub fn gt(property: &str, value: impl Into<Value>) -> Self {
        Self::compare(property, Comparison::Gt, value)
    }

    pub fn gte(property: &str, value: impl Into<Value>) -> Self {
        Self::compare(property, Comparison::Gte, value)
    }

    pub fn lt(property: &str, value: impl Into<Value>) -> Self {
        Self::compare(property, Comparison::Lt, value)
    }

    pub fn lte(property: &str, value: impl Into<Value>) -> Self {
        Self::compare(property, Comparison::Lte, value)
    }

    pub fn between(property: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::Between {
            property: property.into(),
            low: low.into(),
            high: high.into(),
        }
    }

    /// Accepts row keys or anything rendering as one (such as entity ids).
    pub fn key_in<K: ToString>(keys: impl IntoIterator<Item = K>) -> Self {
        Self::KeyIn(keys.into_iter().map(|k| k.to_string()).collect())
    }

    pub fn of_type(entity_type: &str) -> Self {
        Self::OfType(entity_type.into())
    }
}
