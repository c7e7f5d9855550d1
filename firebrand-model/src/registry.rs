//! The immutable mapping registry.

use crate::descriptor::{AssociationKind, EmbeddableDescriptor, EntityDescriptor};
use crate::error::{MappingError, MappingResult};
use crate::{TYPE_COLUMN, nested_column};
use firebrand_cql::Statement;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::info;

/// A schema document: the JSON form of a set of descriptors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub entities: Vec<EntityDescriptor>,
    #[serde(default)]
    pub embeddables: Vec<EmbeddableDescriptor>,
}

/// A named query resolved to its declaring type and parsed template.
#[derive(Debug, Clone)]
pub struct RegisteredQuery {
    pub entity_type: String,
    pub template: String,
    pub statement: Statement,
}

/// Validated descriptors for every mapped type.
///
/// Built once at startup and never mutated; share it behind an `Arc`.
#[derive(Debug)]
pub struct Registry {
    entities: Vec<EntityDescriptor>,
    entity_index: HashMap<String, usize>,
    embeddables: HashMap<String, EmbeddableDescriptor>,
    families: HashMap<String, Vec<String>>,
    named_queries: HashMap<String, RegisteredQuery>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Builds a registry from a JSON [`SchemaDocument`].
    pub fn from_json(json: &str) -> MappingResult<Self> {
        let document: SchemaDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    pub fn from_document(document: SchemaDocument) -> MappingResult<Self> {
        RegistryBuilder {
            entities: document.entities,
            embeddables: document.embeddables,
        }
        .build()
    }

    #[must_use]
    pub fn entity(&self, entity_type: &str) -> Option<&EntityDescriptor> {
        self.entity_index
            .get(entity_type)
            .map(|&i| &self.entities[i])
    }

    /// Returns the first type registered for `family`.
    #[must_use]
    pub fn entity_for_family(&self, family: &str) -> Option<&EntityDescriptor> {
        self.types_in_family(family)
            .first()
            .and_then(|t| self.entity(t))
    }

    /// All entity types stored in `family`, in registration order.
    #[must_use]
    pub fn types_in_family(&self, family: &str) -> &[String] {
        self.families.get(family).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn embeddable(&self, embeddable_type: &str) -> Option<&EmbeddableDescriptor> {
        self.embeddables.get(embeddable_type)
    }

    #[must_use]
    pub fn named_query(&self, name: &str) -> Option<&RegisteredQuery> {
        self.named_queries.get(name)
    }

    /// Storage columns occupied by an embedded value of `embeddable_type`
    /// stored under `prefix`.
    #[must_use]
    pub fn embedded_columns(&self, prefix: &str, embeddable_type: &str) -> Vec<String> {
        let mut columns = Vec::new();
        if let Some(embeddable) = self.embeddables.get(embeddable_type) {
            flatten_columns(prefix, embeddable, &self.embeddables, &mut columns);
        }
        columns
    }

    /// Entity descriptors in registration order.
    pub fn entities(&self) -> impl Iterator<Item = &EntityDescriptor> {
        self.entities.iter()
    }

    /// Number of registered entity types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Collects descriptors and validates them into a [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entities: Vec<EntityDescriptor>,
    embeddables: Vec<EmbeddableDescriptor>,
}

impl RegistryBuilder {
    #[must_use]
    pub fn entity(mut self, descriptor: EntityDescriptor) -> Self {
        self.entities.push(descriptor);
        self
    }

    #[must_use]
    pub fn embeddable(mut self, descriptor: EmbeddableDescriptor) -> Self {
        self.embeddables.push(descriptor);
        self
    }

    pub fn build(self) -> MappingResult<Registry> {
        let mut embeddables = HashMap::with_capacity(self.embeddables.len());
        for descriptor in self.embeddables {
            let name = descriptor.embeddable_type.clone();
            if embeddables.insert(name.clone(), descriptor).is_some() {
                return Err(MappingError::DuplicateType(name));
            }
        }

        let mut entity_index = HashMap::with_capacity(self.entities.len());
        for (i, descriptor) in self.entities.iter().enumerate() {
            let name = &descriptor.entity_type;
            if embeddables.contains_key(name) || entity_index.insert(name.clone(), i).is_some() {
                return Err(MappingError::DuplicateType(name.clone()));
            }
        }

        let mut embeddable_names: Vec<&String> = embeddables.keys().collect();
        embeddable_names.sort();
        for name in &embeddable_names {
            validate_embeddable(&embeddables[*name], &embeddables)?;
        }
        check_embedded_cycles(&embeddable_names, &embeddables)?;

        for descriptor in &self.entities {
            validate_entity(descriptor, &entity_index, &embeddables)?;
        }

        let mut named_queries = HashMap::new();
        for descriptor in &self.entities {
            for query in &descriptor.named_queries {
                if named_queries.contains_key(&query.name) {
                    return Err(MappingError::DuplicateNamedQuery(query.name.clone()));
                }
                let statement = firebrand_cql::parse(&query.template).map_err(|e| {
                    MappingError::InvalidNamedQuery {
                        name: query.name.clone(),
                        reason: e.to_string(),
                    }
                })?;
                named_queries.insert(
                    query.name.clone(),
                    RegisteredQuery {
                        entity_type: descriptor.entity_type.clone(),
                        template: query.template.clone(),
                        statement,
                    },
                );
            }
        }

        let mut families: HashMap<String, Vec<String>> = HashMap::new();
        for descriptor in &self.entities {
            families
                .entry(descriptor.column_family().to_string())
                .or_default()
                .push(descriptor.entity_type.clone());
        }

        info!(
            entities = self.entities.len(),
            embeddables = embeddables.len(),
            named_queries = named_queries.len(),
            "Mapping registry built"
        );

        Ok(Registry {
            entities: self.entities,
            entity_index,
            embeddables,
            families,
            named_queries,
        })
    }
}

fn validate_embeddable(
    descriptor: &EmbeddableDescriptor,
    embeddables: &HashMap<String, EmbeddableDescriptor>,
) -> MappingResult<()> {
    let owner = &descriptor.embeddable_type;
    let invalid = |reason: String| MappingError::InvalidEmbeddable {
        owner: owner.clone(),
        reason,
    };

    let mut properties = HashSet::new();
    for column in &descriptor.columns {
        if column.kind.is_counter() {
            return Err(invalid(format!("'{}' is a counter column", column.property)));
        }
        if column.is_lazy() {
            return Err(invalid(format!("'{}' is declared lazy", column.property)));
        }
        if !properties.insert(column.property.as_str()) {
            return Err(duplicate(owner, &column.property));
        }
    }
    for nested in &descriptor.embedded {
        if !matches!(nested.kind, AssociationKind::Embedded { .. }) {
            return Err(invalid(format!(
                "'{}' is a reference; embeddables may only nest embedded values",
                nested.property
            )));
        }
        if nested.is_lazy() {
            return Err(invalid(format!("'{}' is declared lazy", nested.property)));
        }
        if !embeddables.contains_key(nested.target()) {
            return Err(MappingError::UnknownTarget {
                owner: owner.clone(),
                property: nested.property.clone(),
                target: nested.target().to_string(),
                expected: "embeddable",
            });
        }
        if !properties.insert(nested.property.as_str()) {
            return Err(duplicate(owner, &nested.property));
        }
    }
    Ok(())
}

/// Embedding must form a forest; cycles are only legal through references.
fn check_embedded_cycles(
    names: &[&String],
    embeddables: &HashMap<String, EmbeddableDescriptor>,
) -> MappingResult<()> {
    fn visit<'a>(
        name: &'a str,
        embeddables: &'a HashMap<String, EmbeddableDescriptor>,
        path: &mut Vec<&'a str>,
        done: &mut HashSet<&'a str>,
    ) -> MappingResult<()> {
        if done.contains(name) {
            return Ok(());
        }
        if let Some(start) = path.iter().position(|p| *p == name) {
            let mut cycle = path[start..].to_vec();
            cycle.push(name);
            return Err(MappingError::EmbeddedCycle(cycle.join(" -> ")));
        }
        path.push(name);
        if let Some(descriptor) = embeddables.get(name) {
            for nested in &descriptor.embedded {
                visit(nested.target(), embeddables, path, done)?;
            }
        }
        path.pop();
        done.insert(name);
        Ok(())
    }

    let mut done = HashSet::new();
    for name in names {
        visit(name.as_str(), embeddables, &mut Vec::new(), &mut done)?;
    }
    Ok(())
}

fn validate_entity(
    descriptor: &EntityDescriptor,
    entity_index: &HashMap<String, usize>,
    embeddables: &HashMap<String, EmbeddableDescriptor>,
) -> MappingResult<()> {
    let owner = &descriptor.entity_type;
    if descriptor.id_property().is_empty() {
        return Err(MappingError::MissingId(owner.clone()));
    }

    // Property names are unique, and no property shadows the id.
    let mut properties = HashSet::from([descriptor.id_property()]);
    let members = descriptor
        .columns
        .iter()
        .map(|c| c.property.as_str())
        .chain(descriptor.associations.iter().map(|a| a.property.as_str()));
    for property in members {
        if !properties.insert(property) {
            return Err(duplicate(owner, property));
        }
    }

    validate_counters(descriptor, &properties)?;

    let mut columns = HashSet::from([TYPE_COLUMN.to_string()]);
    let mut claim = |column: String| {
        if columns.insert(column.clone()) {
            Ok(())
        } else {
            Err(duplicate(owner, &column))
        }
    };
    for column in &descriptor.columns {
        claim(column.column().to_string())?;
    }

    for association in &descriptor.associations {
        let target = association.target();
        match &association.kind {
            AssociationKind::Embedded { .. } => {
                let Some(embeddable) = embeddables.get(target) else {
                    return Err(unknown_target(owner, &association.property, target, "embeddable"));
                };
                if association.is_lazy() {
                    return Err(MappingError::InvalidEmbeddable {
                        owner: owner.clone(),
                        reason: format!("'{}' is declared lazy", association.property),
                    });
                }
                let mut flattened = Vec::new();
                flatten_columns(association.column(), embeddable, embeddables, &mut flattened);
                for column in flattened {
                    claim(column)?;
                }
            }
            AssociationKind::Reference { .. } | AssociationKind::Collection { .. } => {
                if !entity_index.contains_key(target) {
                    return Err(unknown_target(owner, &association.property, target, "entity"));
                }
                claim(association.column().to_string())?;
            }
        }
    }
    Ok(())
}

fn validate_counters(descriptor: &EntityDescriptor, properties: &HashSet<&str>) -> MappingResult<()> {
    let invalid = |reason: String| MappingError::InvalidCounter {
        entity_type: descriptor.entity_type.clone(),
        reason,
    };

    if !descriptor.counter {
        return match descriptor.columns.iter().find(|c| c.kind.is_counter()) {
            Some(column) => Err(invalid(format!(
                "'{}' is a counter column outside a counter entity",
                column.property
            ))),
            None => Ok(()),
        };
    }

    if let Some(association) = descriptor.associations.first() {
        return Err(invalid(format!(
            "'{}' is an association; counter entities hold only counter columns",
            association.property
        )));
    }
    let mut deltas = HashSet::new();
    for column in &descriptor.columns {
        let Some(delta) = column.kind.delta_property() else {
            return Err(invalid(format!("'{}' is not a counter column", column.property)));
        };
        if column.is_lazy() {
            return Err(invalid(format!("'{}' is declared lazy", column.property)));
        }
        if properties.contains(delta) || !deltas.insert(delta) {
            return Err(invalid(format!(
                "delta property '{delta}' collides with another property"
            )));
        }
    }
    Ok(())
}

/// Collects the storage columns an embedded value occupies under `prefix`.
fn flatten_columns(
    prefix: &str,
    embeddable: &EmbeddableDescriptor,
    embeddables: &HashMap<String, EmbeddableDescriptor>,
    out: &mut Vec<String>,
) {
    for column in &embeddable.columns {
        out.push(nested_column(prefix, column.column()));
    }
    for nested in &embeddable.embedded {
        if let Some(target) = embeddables.get(nested.target()) {
            flatten_columns(&nested_column(prefix, nested.column()), target, embeddables, out);
        }
    }
}

fn duplicate(owner: &str, column: &str) -> MappingError {
    MappingError::DuplicateColumn {
        owner: owner.to_string(),
        column: column.to_string(),
    }
}

fn unknown_target(owner: &str, property: &str, target: &str, expected: &'static str) -> MappingError {
    MappingError::UnknownTarget {
        owner: owner.to_string(),
        property: property.to_string(),
        target: target.to_string(),
        expected,
    }
}
