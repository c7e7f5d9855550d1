//! Translation of query descriptors into native statements.

use crate::query::{Assign, Delete, Named, Select, Selection, Target, Update};
use crate::{CompileResult, Comparison, Predicate, Query, QueryError};
use firebrand_codec::{encode, literal};
use firebrand_cql::{
    AssignOp, Assignment, DeleteStatement, Operator, Projection, Relation, SelectStatement,
    Statement, Subject, Term, UpdateStatement,
};
use firebrand_model::{
    AssociationKind, ColumnDescriptor, EntityDescriptor, Registry, TYPE_COLUMN,
};
use firebrand_types::{ColumnValue, Value};
use std::collections::BTreeMap;

impl Query {
    /// Compiles to native statement text.
    ///
    /// Compilation is deterministic: the same query and registry always
    /// produce the same text. Native text is returned unchanged.
    pub fn compile(&self, registry: &Registry) -> CompileResult<String> {
        match self {
            Self::Native(text) => Ok(text.clone()),
            other => Ok(other.statement(registry)?.to_string()),
        }
    }

    /// Compiles to a statement tree. Native text is parsed.
    pub fn statement(&self, registry: &Registry) -> CompileResult<Statement> {
        match self {
            Self::Select(select) => select.statement(registry).map(Statement::Select),
            Self::Update(update) => update.statement(registry).map(Statement::Update),
            Self::Delete(delete) => delete.statement(registry).map(Statement::Delete),
            Self::Named(named) => named.statement(registry),
            Self::Native(text) => Ok(firebrand_cql::parse(text)?),
        }
    }
}

impl Select {
    pub fn statement(&self, registry: &Registry) -> CompileResult<SelectStatement> {
        let scope = Scope::resolve(&self.target, registry)?;
        if self.limit == Some(0) {
            return Err(QueryError::InvalidLimit);
        }
        if self.key_range.is_some() && self.start_at.is_some() {
            return Err(QueryError::ConflictingKeyBounds);
        }

        let projection = match &self.selection {
            Selection::All => Projection::All,
            Selection::Count => Projection::Count,
            Selection::Properties(properties) => {
                let mut columns = Vec::new();
                for property in properties {
                    columns.extend(scope.member_columns(property)?);
                }
                Projection::Columns(columns)
            }
        };

        let mut relations = Vec::new();
        for predicate in &self.predicates {
            scope.relations(predicate, &mut relations)?;
        }
        let typed = self
            .predicates
            .iter()
            .any(|p| matches!(p, Predicate::OfType(_)));
        if !typed {
            relations.extend(scope.discriminator());
        }
        if let Some((start, end)) = &self.key_range {
            relations.push(key_relation(Operator::Gte, start));
            relations.push(key_relation(Operator::Lte, end));
        }
        if let Some(start) = &self.start_at {
            relations.push(key_relation(Operator::Gte, start));
        }

        Ok(SelectStatement {
            projection,
            family: scope.family().to_string(),
            relations,
            limit: self.limit,
        })
    }
}

impl Update {
    pub fn statement(&self, registry: &Registry) -> CompileResult<UpdateStatement> {
        let scope = Scope::resolve(&self.target, registry)?;
        if self.assignments.is_empty() {
            return Err(QueryError::EmptyUpdate);
        }
        let mut assignments = Vec::with_capacity(self.assignments.len());
        for (property, assign) in &self.assignments {
            let column = scope.assignable(property)?;
            let operation = match assign {
                Assign::Set(value) => AssignOp::Set(Term::Literal(scope.value(
                    property,
                    column,
                    value,
                )?)),
                Assign::Increment(by) => {
                    if column.is_some_and(|c| !c.kind.is_counter()) {
                        return Err(QueryError::NotCounter(property.clone()));
                    }
                    AssignOp::Increment(*by)
                }
            };
            assignments.push(Assignment {
                column: column.map_or_else(|| property.clone(), |c| c.column().to_string()),
                operation,
            });
        }
        Ok(UpdateStatement {
            family: scope.family().to_string(),
            assignments,
            relations: vec![keys_relation(&self.keys)?],
        })
    }
}

impl Delete {
    pub fn statement(&self, registry: &Registry) -> CompileResult<DeleteStatement> {
        let scope = Scope::resolve(&self.target, registry)?;
        let mut columns = Vec::new();
        for property in &self.properties {
            columns.extend(scope.member_columns(property)?);
        }
        Ok(DeleteStatement {
            columns,
            family: scope.family().to_string(),
            relations: vec![keys_relation(&self.keys)?],
        })
    }
}

impl Named {
    /// Resolves the named template and binds its placeholders.
    pub fn statement(&self, registry: &Registry) -> CompileResult<Statement> {
        let registered = registry
            .named_query(&self.name)
            .ok_or_else(|| QueryError::UnknownNamedQuery(self.name.clone()))?;
        let mut params = BTreeMap::new();
        for placeholder in registered.statement.placeholders() {
            let value = self.params.get(&placeholder).ok_or_else(|| {
                QueryError::MissingParameter {
                    query: self.name.clone(),
                    parameter: placeholder.clone(),
                }
            })?;
            let bound = literal(value)?.ok_or_else(|| QueryError::NullValue(placeholder.clone()))?;
            params.insert(placeholder, bound);
        }
        Ok(registered.statement.bind(&params)?)
    }
}

/// Name resolution for one statement.
enum Scope<'r> {
    Entity {
        registry: &'r Registry,
        descriptor: &'r EntityDescriptor,
    },
    Family(&'r str),
}

impl<'r> Scope<'r> {
    fn resolve(target: &'r Target, registry: &'r Registry) -> CompileResult<Self> {
        match target {
            Target::Entity(entity_type) => registry
                .entity(entity_type)
                .map(|descriptor| Self::Entity {
                    registry,
                    descriptor,
                })
                .ok_or_else(|| QueryError::UnknownType(entity_type.clone())),
            Target::Family(family) => Ok(Self::Family(family)),
        }
    }

    fn family(&self) -> &str {
        match self {
            Self::Entity { descriptor, .. } => descriptor.column_family(),
            Self::Family(family) => family,
        }
    }

    /// `__type = '<type>'` when the target's family holds more than one
    /// entity type.
    fn discriminator(&self) -> Option<Relation> {
        let Self::Entity {
            registry,
            descriptor,
        } = self
        else {
            return None;
        };
        if descriptor.counter || registry.types_in_family(descriptor.column_family()).len() < 2 {
            return None;
        }
        Some(type_relation(&descriptor.entity_type))
    }

    /// Storage columns a property occupies.
    fn member_columns(&self, property: &str) -> CompileResult<Vec<String>> {
        let Self::Entity {
            registry,
            descriptor,
        } = self
        else {
            return Ok(vec![property.to_string()]);
        };
        if let Some(column) = descriptor.column_for(property) {
            return Ok(vec![column.column().to_string()]);
        }
        match descriptor.association_for(property) {
            Some(association) => Ok(match &association.kind {
                AssociationKind::Embedded { target } => {
                    registry.embedded_columns(association.column(), target)
                }
                AssociationKind::Reference { .. } | AssociationKind::Collection { .. } => {
                    vec![association.column().to_string()]
                }
            }),
            None => Err(unknown_property(descriptor, property)),
        }
    }

    /// Resolves a property that a predicate filters on.
    fn filtered(&self, property: &str) -> CompileResult<(Subject, Option<&'r ColumnDescriptor>)> {
        let Self::Entity { descriptor, .. } = *self else {
            return Ok((Subject::Column(property.to_string()), None));
        };
        if property == descriptor.id_property() {
            return Ok((Subject::Key, None));
        }
        match descriptor.column_for(property) {
            Some(column) if column.indexed => {
                Ok((Subject::Column(column.column().to_string()), Some(column)))
            }
            Some(_) => Err(QueryError::NotIndexed {
                entity_type: descriptor.entity_type.clone(),
                property: property.to_string(),
            }),
            None => Err(self.not_a_column(descriptor, property)),
        }
    }

    /// Resolves a property that an update assigns.
    fn assignable(&self, property: &str) -> CompileResult<Option<&'r ColumnDescriptor>> {
        let Self::Entity { descriptor, .. } = *self else {
            return Ok(None);
        };
        descriptor
            .column_for(property)
            .map(Some)
            .ok_or_else(|| self.not_a_column(descriptor, property))
    }

    fn not_a_column(&self, descriptor: &EntityDescriptor, property: &str) -> QueryError {
        if descriptor.association_for(property).is_some() {
            QueryError::AssociationMember {
                entity_type: descriptor.entity_type.clone(),
                property: property.to_string(),
            }
        } else {
            unknown_property(descriptor, property)
        }
    }

    fn value(
        &self,
        property: &str,
        column: Option<&ColumnDescriptor>,
        value: &Value,
    ) -> CompileResult<ColumnValue> {
        let encoded = match column {
            Some(column) => encode(value, column)?,
            None => literal(value)?,
        };
        encoded.ok_or_else(|| QueryError::NullValue(property.to_string()))
    }

    fn relations(&self, predicate: &Predicate, out: &mut Vec<Relation>) -> CompileResult<()> {
        match predicate {
            Predicate::Compare {
                property,
                comparison,
                value,
            } => {
                let (subject, column) = self.filtered(property)?;
                let value = self.value(property, column, value)?;
                out.push(Relation::new(subject, operator(*comparison), value));
            }
            Predicate::Between {
                property,
                low,
                high,
            } => {
                let (subject, column) = self.filtered(property)?;
                let low = self.value(property, column, low)?;
                let high = self.value(property, column, high)?;
                out.push(Relation::new(subject.clone(), Operator::Gte, low));
                out.push(Relation::new(subject, Operator::Lte, high));
            }
            Predicate::KeyIn(keys) => out.push(keys_relation(keys)?),
            Predicate::OfType(entity_type) => {
                if let Self::Entity { registry, .. } = self {
                    if registry.entity(entity_type).is_none() {
                        return Err(QueryError::UnknownType(entity_type.clone()));
                    }
                }
                out.push(type_relation(entity_type));
            }
        }
        Ok(())
    }
}

fn operator(comparison: Comparison) -> Operator {
    match comparison {
        Comparison::Eq => Operator::Eq,
        Comparison::Gt => Operator::Gt,
        Comparison::Gte => Operator::Gte,
        Comparison::Lt => Operator::Lt,
        Comparison::Lte => Operator::Lte,
    }
}

fn type_relation(entity_type: &str) -> Relation {
    Relation::new(
        Subject::Column(TYPE_COLUMN.to_string()),
        Operator::Eq,
        ColumnValue::Text(entity_type.to_string()),
    )
}

fn key_relation(operator: Operator, key: &str) -> Relation {
    Relation::new(Subject::Key, operator, ColumnValue::Text(key.to_string()))
}

/// `KEY = k` for one key, `KEY IN (...)` for several.
fn keys_relation(keys: &[String]) -> CompileResult<Relation> {
    match keys {
        [] => Err(QueryError::EmptyKeySet),
        [key] => Ok(key_relation(Operator::Eq, key)),
        keys => Ok(Relation::within(
            Subject::Key,
            keys.iter().map(|k| ColumnValue::Text(k.clone())).collect(),
        )),
    }
}

fn unknown_property(descriptor: &EntityDescriptor, property: &str) -> QueryError {
    QueryError::UnknownProperty {
        entity_type: descriptor.entity_type.clone(),
        property: property.to_string(),
    }
}
