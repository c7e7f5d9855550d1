use crate::Predicate;
use firebrand_types::Value;
use std::collections::BTreeMap;

/// What a statement runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A registered entity type: properties map to columns and values go
    /// through the column codecs.
    Entity(String),
    /// A column family addressed directly: names are column names and
    /// values are converted without descriptors.
    Family(String),
}

/// Columns returned by a select.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Count,
    Properties(Vec<String>),
}

/// A query ready to compile against a registry.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Select(Select),
    Update(Update),
    Delete(Delete),
    Named(Named),
    /// Native statement text, passed through unchanged.
    Native(String),
}

impl Query {
    /// Starts a select over an entity type.
    pub fn select(entity_type: &str) -> Select {
        Select::new(Target::Entity(entity_type.into()))
    }

    /// Starts a select over a raw column family.
    pub fn select_family(family: &str) -> Select {
        Select::new(Target::Family(family.into()))
    }

    pub fn update(entity_type: &str) -> Update {
        Update::new(Target::Entity(entity_type.into()))
    }

    pub fn update_family(family: &str) -> Update {
        Update::new(Target::Family(family.into()))
    }

    pub fn delete(entity_type: &str) -> Delete {
        Delete::new(Target::Entity(entity_type.into()))
    }

    pub fn delete_family(family: &str) -> Delete {
        Delete::new(Target::Family(family.into()))
    }

    /// References a named query declared on some entity descriptor.
    pub fn named(name: &str) -> Named {
        Named {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn native(text: impl Into<String>) -> Self {
        Self::Native(text.into())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub target: Target,
    pub selection: Selection,
    pub predicates: Vec<Predicate>,
    /// Inclusive row key range.
    pub key_range: Option<(String, String)>,
    /// Cursor: rows from this key onwards.
    pub start_at: Option<String>,
    pub limit: Option<u64>,
}

impl Select {
    fn new(target: Target) -> Self {
        Self {
            target,
            selection: Selection::All,
            predicates: Vec::new(),
            key_range: None,
            start_at: None,
            limit: None,
        }
    }

    #[must_use]
    pub fn count(mut self) -> Self {
        self.selection = Selection::Count;
        self
    }

    #[must_use]
    pub fn properties(mut self, properties: &[&str]) -> Self {
        self.selection = Selection::Properties(properties.iter().map(|p| (*p).to_string()).collect());
        self
    }

    /// Adds a predicate; all predicates must hold.
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    #[must_use]
    pub fn key_range(mut self, start: impl ToString, end: impl ToString) -> Self {
        self.key_range = Some((start.to_string(), end.to_string()));
        self
    }

    #[must_use]
    pub fn start_at(mut self, key: impl ToString) -> Self {
        self.start_at = Some(key.to_string());
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Assign {
    Set(Value),
    Increment(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub target: Target,
    pub assignments: Vec<(String, Assign)>,
    pub keys: Vec<String>,
}

impl Update {
    fn new(target: Target) -> Self {
        Self {
            target,
            assignments: Vec::new(),
            keys: Vec::new(),
        }
    }

    #[must_use]
    pub fn set(mut self, property: &str, value: impl Into<Value>) -> Self {
        self.assignments
            .push((property.into(), Assign::Set(value.into())));
        self
    }

    /// Adds `by` to a counter column.
    #[must_use]
    pub fn increment(mut self, property: &str, by: i64) -> Self {
        self.assignments
            .push((property.into(), Assign::Increment(by)));
        self
    }

    #[must_use]
    pub fn key(mut self, key: impl ToString) -> Self {
        self.keys.push(key.to_string());
        self
    }

    #[must_use]
    pub fn keys<K: ToString>(mut self, keys: impl IntoIterator<Item = K>) -> Self {
        self.keys.extend(keys.into_iter().map(|k| k.to_string()));
        self
    }
}

/// Deletes whole rows, or only the listed properties' columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub target: Target,
    pub properties: Vec<String>,
    pub keys: Vec<String>,
}

impl Delete {
    fn new(target: Target) -> Self {
        Self {
            target,
            properties: Vec::new(),
            keys: Vec::new(),
        }
    }

    #[must_use]
    pub fn property(mut self, property: &str) -> Self {
        self.properties.push(property.into());
        self
    }

    #[must_use]
    pub fn key(mut self, key: impl ToString) -> Self {
        self.keys.push(key.to_string());
        self
    }

    #[must_use]
    pub fn keys<K: ToString>(mut self, keys: impl IntoIterator<Item = K>) -> Self {
        self.keys.extend(keys.into_iter().map(|k| k.to_string()));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Named {
    pub name: String,
    pub params: BTreeMap<String, Value>,
}

impl Named {
    #[must_use]
    pub fn param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

impl From<Select> for Query {
    fn from(select: Select) -> Self {
        Self::Select(select)
    }
}

impl From<Update> for Query {
    fn from(update: Update) -> Self {
        Self::Update(update)
    }
}

impl From<Delete> for Query {
    fn from(delete: Delete) -> Self {
        Self::Delete(delete)
    }
}

impl From<Named> for Query {
    fn from(named: Named) -> Self {
        Self::Named(named)
    }
}
