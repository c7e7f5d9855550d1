//! Materializing rows into instances, eagerly or through deferred loaders.

use crate::context::LoadContext;
use crate::entity::Slot;
use crate::{EngineError, EngineResult, Entity, EntityFactory, EntityRef, Loadable};
use firebrand_codec::{CodecError, decode, decode_collection, decode_reference, unflatten};
use firebrand_model::{AssociationKind, ColumnDescriptor, EntityDescriptor, TYPE_COLUMN};
use firebrand_query::{Predicate, Query};
use firebrand_storage::QueryResult;
use firebrand_types::{ColumnValue, EntityId, Row, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, trace, warn};

impl EntityFactory {
    /// Reads one entity, reusing an instance already materialized by the
    /// same operation.
    pub(crate) fn load(
        &self,
        entity_type: &str,
        id: &EntityId,
        ctx: &mut LoadContext,
    ) -> EngineResult<Option<EntityRef>> {
        let descriptor = self.descriptor(entity_type)?;
        let family = descriptor.column_family();
        if let Some(existing) = ctx.get(family, id) {
            return Ok(Some(existing));
        }
        let row = self.column_store().read_row(
            family,
            &id.to_key(),
            self.config().read_consistency,
        )?;
        match row {
            Some(row) => self.materialize(descriptor, &row, ctx).map(Some),
            None => Ok(None),
        }
    }

    /// Builds an instance from its row.
    ///
    /// The handle is registered in `ctx` before any member is decoded, so
    /// references back to it (cycles) resolve to the same instance.
    pub(crate) fn materialize(
        &self,
        requested: &EntityDescriptor,
        row: &Row,
        ctx: &mut LoadContext,
    ) -> EngineResult<EntityRef> {
        let id = EntityId::parse(&row.key).map_err(|e| EngineError::InvalidKey {
            key: row.key.clone(),
            reason: e.to_string(),
        })?;
        let family = requested.column_family();
        if let Some(existing) = ctx.get(family, &id) {
            return Ok(existing);
        }
        let descriptor = self.discriminated(requested, row);
        trace!(entity_type = %descriptor.entity_type, %id, "materializing row");

        let mut entity = Entity::new(&descriptor.entity_type);
        entity.id = Some(id);
        entity.persisted = true;
        let handle = EntityRef::new(entity);
        ctx.insert(family, id, handle.clone());

        let mut properties = BTreeMap::new();
        for column in &descriptor.columns {
            self.column_slots(descriptor, column, row, &mut properties)?;
        }
        for association in &descriptor.associations {
            let property = association.property.clone();
            let raw = row.get(association.column());
            let slot = match &association.kind {
                AssociationKind::Embedded { target } => {
                    let embeddable = self
                        .registry()
                        .embeddable(target)
                        .ok_or_else(|| CodecError::UnknownEmbeddable(target.clone()))?;
                    match unflatten(association.column(), row, embeddable, self.registry())? {
                        Some(value) => Slot::Embedded(Some(value)),
                        None => continue,
                    }
                }
                AssociationKind::Reference { target } => {
                    let Some(target_id) = decode_reference(raw, &property)? else {
                        continue;
                    };
                    let loadable = if association.is_lazy() {
                        let factory = self.clone();
                        let target = target.clone();
                        Loadable::deferred(move || {
                            debug!(entity_type = %target, id = %target_id, "lazy reference load");
                            factory.get(&target, &target_id)
                        })
                    } else {
                        Loadable::ready(self.resolve(target, &target_id, ctx)?)
                    };
                    Slot::Reference(Arc::new(loadable))
                }
                AssociationKind::Collection { target } => {
                    if raw.is_none() {
                        continue;
                    }
                    let ids = decode_collection(raw, &property)?;
                    let loadable = if association.is_lazy() {
                        let factory = self.clone();
                        let target = target.clone();
                        Loadable::deferred(move || factory.load_many(&target, &ids))
                    } else {
                        let mut items = Vec::with_capacity(ids.len());
                        for target_id in &ids {
                            items.extend(self.resolve(target, target_id, ctx)?);
                        }
                        Loadable::ready(items)
                    };
                    Slot::Collection(Arc::new(loadable))
                }
            };
            properties.insert(property, slot);
        }

        let mut entity = handle.write();
        entity.properties = properties;
        for listener in self.listeners(&descriptor.entity_type) {
            listener.post_load(&mut entity);
        }
        entity.dirty = false;
        drop(entity);
        Ok(handle)
    }

    /// Loads the target of an eager reference; a dangling id reads as no
    /// target.
    fn resolve(
        &self,
        entity_type: &str,
        id: &EntityId,
        ctx: &mut LoadContext,
    ) -> EngineResult<Option<EntityRef>> {
        let target = self.load(entity_type, id, ctx)?;
        if target.is_none() {
            warn!(entity_type, %id, "dangling reference");
        }
        Ok(target)
    }

    /// Decodes one column into its property slot(s).
    fn column_slots(
        &self,
        descriptor: &EntityDescriptor,
        column: &ColumnDescriptor,
        row: &Row,
        properties: &mut BTreeMap<String, Slot>,
    ) -> EngineResult<()> {
        if let Some(delta) = column.kind.delta_property() {
            let total = match decode(row.get(column.column()), column)? {
                Value::Null => Value::Long(0),
                total => total,
            };
            properties.insert(column.property.clone(), Slot::value(total));
            properties.insert(delta.to_string(), Slot::value(Value::Long(0)));
            return Ok(());
        }
        if column.is_lazy() {
            let factory = self.clone();
            let family = descriptor.column_family().to_string();
            let key = row.key.clone();
            let column = column.clone();
            let property = column.property.clone();
            let loadable = Loadable::deferred(move || factory.load_column(&family, &key, &column));
            properties.insert(property, Slot::Value(Arc::new(loadable)));
            return Ok(());
        }
        let value = decode(row.get(column.column()), column)?;
        if !value.is_null() {
            properties.insert(column.property.clone(), Slot::value(value));
        }
        Ok(())
    }

    /// Picks the type named by the row's discriminator when it is another
    /// registered type sharing the family.
    fn discriminated<'d>(&'d self, requested: &'d EntityDescriptor, row: &Row) -> &'d EntityDescriptor {
        let Some(ColumnValue::Text(stored)) = row.get(TYPE_COLUMN) else {
            return requested;
        };
        if *stored == requested.entity_type {
            return requested;
        }
        match self.registry().entity(stored) {
            Some(actual) if actual.column_family() == requested.column_family() => actual,
            _ => requested,
        }
    }

    // ── Deferred loaders ─────────────────────────────────────────

    fn load_column(&self, family: &str, key: &str, column: &ColumnDescriptor) -> EngineResult<Value> {
        debug!(family, key, column = column.column(), "lazy column load");
        let row = self.column_store().read_columns(
            family,
            key,
            &[column.column()],
            self.config().read_consistency,
        )?;
        Ok(decode(row.as_ref().and_then(|r| r.get(column.column())), column)?)
    }

    /// Loads a collection's members with one key-set query and returns them
    /// in list order. Dangling ids are dropped.
    fn load_many(&self, entity_type: &str, ids: &[EntityId]) -> EngineResult<Vec<EntityRef>> {
        debug!(entity_type, members = ids.len(), "lazy collection load");
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let descriptor = self.descriptor(entity_type)?;
        // Family scope: members may be stored as another type of the family.
        let query = Query::select_family(descriptor.column_family()).filter(Predicate::key_in(ids));
        let rows = match self.execute_query(query)? {
            QueryResult::Rows(rows) => rows,
            other => return Err(crate::factory::unexpected("rows", &other)),
        };
        let by_id: HashMap<EntityId, EntityRef> = self
            .materialize_rows(descriptor, rows)?
            .into_iter()
            .filter_map(|entity| entity.id().map(|id| (id, entity)))
            .collect();
        Ok(ids.iter().filter_map(|id| by_id.get(id).cloned()).collect())
    }
}
