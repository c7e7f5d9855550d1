//! The entity factory: public entry point of the persistence engine.

use crate::context::{LoadContext, PersistContext};
use crate::result::SingleResult;
use crate::{EngineError, EngineResult, Entity, EntityListener, EntityRef, FactoryConfig};
use firebrand_cql::Statement;
use firebrand_model::{Embedded, EntityDescriptor, Registry};
use firebrand_query::Query;
use firebrand_storage::{ColumnStore, QueryResult};
use firebrand_types::{EntityId, Row};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Persists entity graphs to a column store and materializes them back.
///
/// Cheap to clone: clones share the store, the registry and the
/// listeners. Every call is synchronous; storage calls are the only points
/// where it blocks.
#[derive(Clone)]
pub struct EntityFactory {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn ColumnStore>,
    registry: Arc<Registry>,
    listeners: HashMap<String, Vec<Arc<dyn EntityListener>>>,
    config: FactoryConfig,
}

impl fmt::Debug for EntityFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityFactory")
            .field("keyspace", &self.inner.config.keyspace)
            .field("entity_types", &self.inner.registry.len())
            .field(
                "listeners",
                &self.inner.listeners.values().map(Vec::len).sum::<usize>(),
            )
            .finish_non_exhaustive()
    }
}

/// Builder for [`EntityFactory`].
pub struct EntityFactoryBuilder {
    registry: Arc<Registry>,
    listeners: Vec<(String, Arc<dyn EntityListener>)>,
    config: FactoryConfig,
}

impl EntityFactoryBuilder {
    #[must_use]
    pub fn config(mut self, config: FactoryConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a lifecycle listener for `entity_type`. Listeners of one
    /// type run in registration order.
    #[must_use]
    pub fn listener(mut self, entity_type: &str, listener: impl EntityListener + 'static) -> Self {
        self.listeners
            .push((entity_type.to_string(), Arc::new(listener)));
        self
    }

    /// Builds the factory on top of `store`.
    ///
    /// Fails if a listener names an unregistered type.
    pub fn build(self, store: Arc<dyn ColumnStore>) -> EngineResult<EntityFactory> {
        let mut listeners: HashMap<String, Vec<Arc<dyn EntityListener>>> = HashMap::new();
        for (entity_type, listener) in self.listeners {
            if self.registry.entity(&entity_type).is_none() {
                return Err(EngineError::UnknownEntity(entity_type));
            }
            listeners.entry(entity_type).or_default().push(listener);
        }
        info!(
            keyspace = %self.config.keyspace,
            entity_types = self.registry.len(),
            listeners = listeners.values().map(Vec::len).sum::<usize>(),
            "entity factory ready"
        );
        Ok(EntityFactory {
            inner: Arc::new(Inner {
                store,
                registry: self.registry,
                listeners,
                config: self.config,
            }),
        })
    }
}

impl EntityFactory {
    pub fn builder(registry: impl Into<Arc<Registry>>) -> EntityFactoryBuilder {
        EntityFactoryBuilder {
            registry: registry.into(),
            listeners: Vec::new(),
            config: FactoryConfig::default(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &dyn ColumnStore {
        self.inner.store.as_ref()
    }

    // ── Instances ────────────────────────────────────────────────

    /// Creates a bare instance of a registered type. No I/O.
    pub fn new_instance(&self, entity_type: &str) -> EngineResult<EntityRef> {
        self.descriptor(entity_type)?;
        Ok(EntityRef::new(Entity::new(entity_type)))
    }

    /// Creates an empty value of a registered embeddable type.
    pub fn new_embedded(&self, embeddable_type: &str) -> EngineResult<Embedded> {
        self.inner
            .registry
            .embeddable(embeddable_type)
            .map(|descriptor| Embedded::new(&descriptor.embeddable_type))
            .ok_or_else(|| EngineError::UnknownEntity(embeddable_type.to_string()))
    }

    // ── Writes ───────────────────────────────────────────────────

    /// Writes `entity` and, first, every associated entity that is unsaved
    /// or has pending mutations.
    ///
    /// The cascade is a sequence of independent row writes: a failure part
    /// way leaves the rows written so far in place.
    pub fn persist(&self, entity: &EntityRef) -> EngineResult<()> {
        self.persist_with(entity, &mut PersistContext::default())
    }

    /// Persists each entity in turn.
    pub fn persist_all<'a>(&self, entities: impl IntoIterator<Item = &'a EntityRef>) -> EngineResult<()> {
        for entity in entities {
            self.persist(entity)?;
        }
        Ok(())
    }

    /// Deletes the row of a persisted instance. Associated entities are not
    /// touched.
    pub fn remove(&self, entity: &EntityRef) -> EngineResult<()> {
        let (entity_type, id) = {
            let e = entity.read();
            (e.entity_type.clone(), e.id)
        };
        let id = id.ok_or_else(|| EngineError::NotPersisted(entity_type.clone()))?;
        self.remove_by_id(&entity_type, &id)
    }

    pub fn remove_by_id(&self, entity_type: &str, id: &EntityId) -> EngineResult<()> {
        let family = self.descriptor(entity_type)?.column_family();
        self.inner
            .store
            .delete_row(family, &id.to_key(), self.inner.config.write_consistency)?;
        debug!(entity_type, %id, "row deleted");
        Ok(())
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Reads one entity by id. Absent rows are `Ok(None)`.
    pub fn get(&self, entity_type: &str, id: &EntityId) -> EngineResult<Option<EntityRef>> {
        self.load(entity_type, id, &mut LoadContext::default())
    }

    /// Runs a select and materializes every row, in store order.
    pub fn get_result_list(
        &self,
        entity_type: &str,
        query: impl Into<Query>,
    ) -> EngineResult<Vec<EntityRef>> {
        let descriptor = self.descriptor(entity_type)?;
        let rows = match self.execute_query(query)? {
            QueryResult::Rows(rows) => rows,
            other => return Err(unexpected("rows", &other)),
        };
        self.materialize_rows(descriptor, rows)
    }

    /// Runs a query expected to produce at most one result.
    ///
    /// `R = EntityRef` materializes the single row ([`EngineError::NonUniqueResult`]
    /// if there are more); `R = i64` or `R = Value` read an aggregate such
    /// as `COUNT(*)`.
    pub fn get_single_result<R: SingleResult>(
        &self,
        entity_type: &str,
        query: impl Into<Query>,
    ) -> EngineResult<Option<R>> {
        let result = self.execute_query(query)?;
        R::from_result(self, entity_type, result)
    }

    /// Compiles and runs any query, returning the raw store result.
    ///
    /// Selects run at the read consistency, updates and deletes at the
    /// write consistency.
    pub fn execute_query(&self, query: impl Into<Query>) -> EngineResult<QueryResult> {
        let statement = query.into().statement(&self.inner.registry)?;
        let consistency = match statement {
            Statement::Select(_) => self.inner.config.read_consistency,
            Statement::Update(_) | Statement::Delete(_) => self.inner.config.write_consistency,
        };
        let text = statement.to_string();
        debug!(statement = %text, "executing query");
        Ok(self.inner.store.execute(&text, consistency)?)
    }

    // ── Internals shared by the read and write paths ─────────────

    pub(crate) fn descriptor(&self, entity_type: &str) -> EngineResult<&EntityDescriptor> {
        self.inner
            .registry
            .entity(entity_type)
            .ok_or_else(|| EngineError::UnknownEntity(entity_type.to_string()))
    }

    pub(crate) fn listeners(&self, entity_type: &str) -> &[Arc<dyn EntityListener>] {
        self.inner
            .listeners
            .get(entity_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn column_store(&self) -> &Arc<dyn ColumnStore> {
        &self.inner.store
    }

    /// Materializes rows of one select within a single load context,
    /// skipping rows without columns.
    pub(crate) fn materialize_rows(
        &self,
        descriptor: &EntityDescriptor,
        rows: Vec<Row>,
    ) -> EngineResult<Vec<EntityRef>> {
        let mut ctx = LoadContext::default();
        let mut entities = Vec::with_capacity(rows.len());
        for row in rows.into_iter().filter(|row| !row.is_empty()) {
            entities.push(self.materialize(descriptor, &row, &mut ctx)?);
        }
        debug!(
            entity_type = %descriptor.entity_type,
            rows = entities.len(),
            materialized = ctx.len(),
            "result list loaded"
        );
        Ok(entities)
    }
}

pub(crate) fn unexpected(expected: &str, result: &QueryResult) -> EngineError {
    let found = match result {
        QueryResult::Rows(rows) => format!("{} rows", rows.len()),
        QueryResult::Scalar(value) => format!("a {} scalar", value.kind_name()),
        QueryResult::Void => "no result".to_string(),
    };
    EngineError::UnexpectedResult(format!("expected {expected}, got {found}"))
}
