//! Persisting instances: cascade, id assignment and row encoding.

use crate::context::PersistContext;
use crate::entity::Slot;
use crate::{EngineError, EngineResult, EntityFactory, EntityRef};
use firebrand_codec::{CodecError, encode, encode_collection, encode_reference, flatten};
use firebrand_model::{AssociationKind, ColumnDescriptor, EntityDescriptor, TYPE_COLUMN};
use firebrand_types::{ColumnValue, EntityId, Value};
use std::collections::BTreeMap;
use tracing::{debug, trace};

impl EntityFactory {
    pub(crate) fn persist_with(
        &self,
        entity: &EntityRef,
        ctx: &mut PersistContext,
    ) -> EngineResult<()> {
        if !ctx.enter(entity) {
            return Ok(());
        }
        let entity_type = entity.entity_type();
        let descriptor = self.descriptor(&entity_type)?;

        let (id, first, slots) = self.prepare(entity, descriptor)?;

        // Targets first, so their ids exist when this row references them.
        for slot in slots.values() {
            for target in slot.loaded_targets() {
                if target.id().is_none() || target.is_dirty() {
                    self.persist_with(&target, ctx)?;
                }
            }
        }

        let columns = self.encode_row(descriptor, &slots, first)?;
        let key = id.to_key();
        debug!(
            entity_type = %entity_type,
            id = %key,
            columns = columns.len(),
            "writing row"
        );
        self.column_store().write_columns(
            descriptor.column_family(),
            &key,
            columns,
            self.config().write_consistency,
        )?;

        let mut written = entity.write();
        for column in &descriptor.columns {
            if let Some(delta) = column.kind.delta_property() {
                written
                    .properties
                    .insert(delta.to_string(), Slot::value(Value::Long(0)));
            }
        }
        written.dirty = false;
        written.persisted = true;
        Ok(())
    }

    /// Assigns an id if there is none, runs the pre-persist listeners before
    /// the first write and snapshots the members to write. An id assigned
    /// here is taken back if the instance is rejected.
    fn prepare(
        &self,
        entity: &EntityRef,
        descriptor: &EntityDescriptor,
    ) -> EngineResult<(EntityId, bool, BTreeMap<String, Slot>)> {
        let mut e = entity.write();
        let first = !e.persisted;
        let (id, assigned) = match e.id {
            Some(id) => (id, false),
            None => {
                let id = EntityId::new();
                e.id = Some(id);
                trace!(entity_type = %descriptor.entity_type, %id, "id assigned");
                (id, true)
            }
        };
        let mut outcome = Ok(());
        if first {
            for listener in self.listeners(&descriptor.entity_type) {
                if let Err(reason) = listener.pre_persist(&mut e) {
                    outcome = Err(EngineError::Rejected {
                        entity_type: descriptor.entity_type.clone(),
                        reason,
                    });
                    break;
                }
            }
        }
        if let Err(err) = outcome.and_then(|()| check_members(descriptor, &e.properties)) {
            if assigned {
                e.id = None;
            }
            return Err(err);
        }
        Ok((id, first, e.properties.clone()))
    }

    /// Encodes the loaded members of an instance. Unloaded lazy members
    /// and null values produce no column.
    ///
    /// Counter columns always carry a delta. On the first write the
    /// in-memory counter value is added to it, since the stored total
    /// starts at zero.
    fn encode_row(
        &self,
        descriptor: &EntityDescriptor,
        slots: &BTreeMap<String, Slot>,
        first: bool,
    ) -> EngineResult<BTreeMap<String, ColumnValue>> {
        let registry = self.registry();
        let mut columns = BTreeMap::new();
        if !descriptor.counter {
            columns.insert(
                TYPE_COLUMN.to_string(),
                ColumnValue::Text(descriptor.entity_type.clone()),
            );
        }

        for column in &descriptor.columns {
            if let Some(delta) = column.kind.delta_property() {
                let mut amount = counter_amount(slots, delta, column)?;
                if first {
                    amount = amount.wrapping_add(counter_amount(slots, &column.property, column)?);
                }
                columns.insert(column.column().to_string(), ColumnValue::Counter(amount));
                continue;
            }
            let Some(Slot::Value(loadable)) = slots.get(&column.property) else {
                continue;
            };
            let Some(value) = loadable.peek() else {
                continue;
            };
            if let Some(encoded) = encode(value, column)? {
                columns.insert(column.column().to_string(), encoded);
            }
        }

        for association in &descriptor.associations {
            match (&association.kind, slots.get(&association.property)) {
                (AssociationKind::Embedded { target }, Some(Slot::Embedded(Some(value)))) => {
                    let embeddable = registry
                        .embeddable(target)
                        .ok_or_else(|| CodecError::UnknownEmbeddable(target.clone()))?;
                    flatten(association.column(), value, embeddable, registry, &mut columns)?;
                }
                (AssociationKind::Reference { .. }, Some(Slot::Reference(loadable))) => {
                    if let Some(Some(target)) = loadable.peek().map(|t| &**t) {
                        let id = persisted_id(target)?;
                        columns.insert(association.column().to_string(), encode_reference(&id));
                    }
                }
                (AssociationKind::Collection { .. }, Some(Slot::Collection(loadable))) => {
                    if let Some(items) = loadable.peek() {
                        let ids = items
                            .iter()
                            .map(persisted_id)
                            .collect::<EngineResult<Vec<_>>>()?;
                        columns.insert(association.column().to_string(), encode_collection(&ids)?);
                    }
                }
                _ => {}
            }
        }
        Ok(columns)
    }
}

/// Integral value held by a counter or delta property; unset reads as 0.
fn counter_amount(
    slots: &BTreeMap<String, Slot>,
    property: &str,
    column: &ColumnDescriptor,
) -> EngineResult<i64> {
    let Some(Slot::Value(loadable)) = slots.get(property) else {
        return Ok(0);
    };
    let Some(value) = loadable.peek() else {
        return Ok(0);
    };
    match encode(value, column)? {
        Some(ColumnValue::Counter(amount)) => Ok(amount),
        _ => Ok(0),
    }
}

fn persisted_id(entity: &EntityRef) -> EngineResult<EntityId> {
    entity
        .id()
        .ok_or_else(|| EngineError::NotPersisted(entity.entity_type()))
}

/// Rejects properties the descriptor does not map, and members holding the
/// wrong kind of slot.
fn check_members(descriptor: &EntityDescriptor, slots: &BTreeMap<String, Slot>) -> EngineResult<()> {
    for (property, slot) in slots {
        let expected = if descriptor.column_for(property).is_some()
            || descriptor.counter_for_delta(property).is_some()
        {
            "value"
        } else if let Some(association) = descriptor.association_for(property) {
            match association.kind {
                AssociationKind::Embedded { .. } => "embedded value",
                AssociationKind::Reference { .. } => "reference",
                AssociationKind::Collection { .. } => "collection",
            }
        } else {
            return Err(EngineError::UnknownProperty {
                entity_type: descriptor.entity_type.clone(),
                property: property.clone(),
            });
        };
        let matches = matches!(
            (expected, slot),
            ("value", Slot::Value(_))
                | ("embedded value", Slot::Embedded(_))
                | ("reference", Slot::Reference(_))
                | ("collection", Slot::Collection(_))
        );
        if !matches {
            return Err(EngineError::MemberKind {
                entity_type: descriptor.entity_type.clone(),
                property: property.clone(),
                expected,
            });
        }
    }
    Ok(())
}
