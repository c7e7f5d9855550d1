use serde::{Deserialize, Serialize};

/// Describes how one entity type maps onto a column family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    pub entity_type: String,
    /// Column family holding the rows. Defaults to the entity type name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_family: Option<String>,
    /// Property carrying the entity id. Required; checked at registry build.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_property: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default)]
    pub associations: Vec<AssociationDescriptor>,
    #[serde(default)]
    pub named_queries: Vec<NamedQuery>,
    /// Every column of a counter entity is a counter column.
    #[serde(default)]
    pub counter: bool,
}

impl EntityDescriptor {
    pub fn new(entity_type: &str) -> Self {
        Self {
            entity_type: entity_type.into(),
            column_family: None,
            id_property: None,
            columns: Vec::new(),
            associations: Vec::new(),
            named_queries: Vec::new(),
            counter: false,
        }
    }

    /// Sets the id property.
    #[must_use]
    pub fn id(mut self, property: &str) -> Self {
        self.id_property = Some(property.into());
        self
    }

    /// Stores rows in `family` instead of a family named after the type.
    #[must_use]
    pub fn family(mut self, family: &str) -> Self {
        self.column_family = Some(family.into());
        self
    }

    #[must_use]
    pub fn column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub fn association(mut self, association: AssociationDescriptor) -> Self {
        self.associations.push(association);
        self
    }

    /// Declares a named query. `template` may contain `:name` placeholders.
    #[must_use]
    pub fn named_query(mut self, name: &str, template: &str) -> Self {
        self.named_queries.push(NamedQuery {
            name: name.into(),
            template: template.into(),
        });
        self
    }

    /// Marks the type as a counter entity.
    #[must_use]
    pub fn counter(mut self) -> Self {
        self.counter = true;
        self
    }

    /// Column family holding this type's rows.
    #[must_use]
    pub fn column_family(&self) -> &str {
        self.column_family.as_deref().unwrap_or(&self.entity_type)
    }

    /// The id property name, or `""` if none was declared.
    #[must_use]
    pub fn id_property(&self) -> &str {
        self.id_property.as_deref().unwrap_or_default()
    }

    /// Finds a scalar column by property name.
    #[must_use]
    pub fn column_for(&self, property: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.property == property)
    }

    /// Finds an association by property name.
    #[must_use]
    pub fn association_for(&self, property: &str) -> Option<&AssociationDescriptor> {
        self.associations.iter().find(|a| a.property == property)
    }

    /// Finds the counter column whose delta is kept in `property`.
    #[must_use]
    pub fn counter_for_delta(&self, property: &str) -> Option<&ColumnDescriptor> {
        self.columns
            .iter()
            .find(|c| c.kind.delta_property() == Some(property))
    }
}

/// A named query template declared on an entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedQuery {
    pub name: String,
    pub template: String,
}

/// A scalar property stored in a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub property: String,
    /// Storage column name when it differs from the property name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub kind: ColumnKind,
    /// Only indexed columns may appear in query predicates.
    #[serde(default)]
    pub indexed: bool,
    #[serde(default)]
    pub fetch: FetchMode,
}

impl ColumnDescriptor {
    pub fn new(property: &str, kind: ColumnKind) -> Self {
        Self {
            property: property.into(),
            column: None,
            kind,
            indexed: false,
            fetch: FetchMode::Eager,
        }
    }

    /// Shorthand for a text column.
    pub fn text(property: &str) -> Self {
        Self::new(property, ColumnKind::Text)
    }

    /// Shorthand for a 32-bit integer column.
    pub fn int(property: &str) -> Self {
        Self::new(property, ColumnKind::Int)
    }

    /// Shorthand for a 64-bit integer column.
    pub fn long(property: &str) -> Self {
        Self::new(property, ColumnKind::Long)
    }

    /// Shorthand for a floating point column.
    pub fn double(property: &str) -> Self {
        Self::new(property, ColumnKind::Double)
    }

    /// Shorthand for a boolean column.
    pub fn boolean(property: &str) -> Self {
        Self::new(property, ColumnKind::Boolean)
    }

    /// Shorthand for a timestamp column.
    pub fn timestamp(property: &str) -> Self {
        Self::new(property, ColumnKind::Timestamp)
    }

    /// Shorthand for a byte array column.
    pub fn bytes(property: &str) -> Self {
        Self::new(property, ColumnKind::Bytes)
    }

    /// Shorthand for an enumeration stored by symbolic name.
    pub fn enumeration(property: &str, variants: &[&str]) -> Self {
        Self::new(
            property,
            ColumnKind::Enum {
                variants: variants.iter().map(|v| (*v).to_string()).collect(),
            },
        )
    }

    /// Shorthand for an arbitrary value stored as a generic payload.
    pub fn serialized(property: &str) -> Self {
        Self::new(property, ColumnKind::Serialized)
    }

    /// Shorthand for a counter column whose pending increment lives in
    /// `delta_property`.
    pub fn counter(property: &str, delta_property: &str) -> Self {
        Self::new(
            property,
            ColumnKind::Counter {
                delta_property: delta_property.into(),
            },
        )
    }

    #[must_use]
    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    #[must_use]
    pub fn lazy(mut self) -> Self {
        self.fetch = FetchMode::Lazy;
        self
    }

    #[must_use]
    pub fn column_name(mut self, column: &str) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Storage column name.
    #[must_use]
    pub fn column(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.property)
    }

    #[must_use]
    pub fn is_lazy(&self) -> bool {
        self.fetch == FetchMode::Lazy
    }
}

/// Codec applied to a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Int,
    Long,
    Double,
    Boolean,
    Timestamp,
    Bytes,
    /// Symbolic name, checked against `variants`.
    Enum { variants: Vec<String> },
    /// Any value, as a self-describing payload.
    Serialized,
    Counter { delta_property: String },
}

impl ColumnKind {
    #[must_use]
    pub fn delta_property(&self) -> Option<&str> {
        match self {
            Self::Counter { delta_property } => Some(delta_property),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_counter(&self) -> bool {
        matches!(self, Self::Counter { .. })
    }

    /// Short name used in error messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Int => "int",
            Self::Long => "long",
            Self::Double => "double",
            Self::Boolean => "boolean",
            Self::Timestamp => "timestamp",
            Self::Bytes => "bytes",
            Self::Enum { .. } => "enum",
            Self::Serialized => "serialized",
            Self::Counter { .. } => "counter",
        }
    }
}

/// When a member is materialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// Decoded together with the row.
    #[default]
    Eager,
    /// Decoded on first access.
    Lazy,
}

/// A property that refers to another mapped type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationDescriptor {
    pub property: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub kind: AssociationKind,
    #[serde(default)]
    pub fetch: FetchMode,
}

impl AssociationDescriptor {
    fn new(property: &str, kind: AssociationKind) -> Self {
        Self {
            property: property.into(),
            column: None,
            kind,
            fetch: FetchMode::Eager,
        }
    }

    /// A value object flattened into the owner's row.
    pub fn embedded(property: &str, embeddable_type: &str) -> Self {
        Self::new(
            property,
            AssociationKind::Embedded {
                target: embeddable_type.into(),
            },
        )
    }

    /// A single reference to another entity, stored as its id.
    pub fn reference(property: &str, entity_type: &str) -> Self {
        Self::new(
            property,
            AssociationKind::Reference {
                target: entity_type.into(),
            },
        )
    }

    /// An ordered list of references to other entities.
    pub fn collection(property: &str, entity_type: &str) -> Self {
        Self::new(
            property,
            AssociationKind::Collection {
                target: entity_type.into(),
            },
        )
    }

    #[must_use]
    pub fn lazy(mut self) -> Self {
        self.fetch = FetchMode::Lazy;
        self
    }

    #[must_use]
    pub fn column_name(mut self, column: &str) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Storage column name (the prefix for embedded values).
    #[must_use]
    pub fn column(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.property)
    }

    #[must_use]
    pub fn target(&self) -> &str {
        match &self.kind {
            AssociationKind::Embedded { target }
            | AssociationKind::Reference { target }
            | AssociationKind::Collection { target } => target,
        }
    }

    #[must_use]
    pub fn is_lazy(&self) -> bool {
        self.fetch == FetchMode::Lazy
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssociationKind {
    Embedded { target: String },
    Reference { target: String },
    Collection { target: String },
}

/// Describes a value type embedded in an owner's row. Embeddables have no
/// id and no row of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddableDescriptor {
    pub embeddable_type: String,
    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,
    /// Nested embedded values. Only `Embedded` associations are legal here.
    #[serde(default)]
    pub embedded: Vec<AssociationDescriptor>,
}

impl EmbeddableDescriptor {
    pub fn new(embeddable_type: &str) -> Self {
        Self {
            embeddable_type: embeddable_type.into(),
            columns: Vec::new(),
            embedded: Vec::new(),
        }
    }

    #[must_use]
    pub fn column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    /// Nests another embeddable under `property`.
    #[must_use]
    pub fn embed(mut self, property: &str, embeddable_type: &str) -> Self {
        self.embedded
            .push(AssociationDescriptor::embedded(property, embeddable_type));
        self
    }

    #[must_use]
    pub fn column_for(&self, property: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.property == property)
    }
}
