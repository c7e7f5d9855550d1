//! Entity instances and shared handles.

use crate::{EngineError, EngineResult, Loadable};
use firebrand_model::Embedded;
use firebrand_types::{ColumnEnum, EntityId, Timestamp, Value};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Storage of one property on an instance.
#[derive(Clone)]
pub(crate) enum Slot {
    Value(Arc<Loadable<Value>>),
    Embedded(Option<Embedded>),
    Reference(Arc<Loadable<Option<EntityRef>>>),
    Collection(Arc<Loadable<Vec<EntityRef>>>),
}

impl Slot {
    pub(crate) fn value(value: Value) -> Self {
        Self::Value(Arc::new(Loadable::ready(value)))
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::Value(_) => "value",
            Self::Embedded(_) => "embedded value",
            Self::Reference(_) => "reference",
            Self::Collection(_) => "collection",
        }
    }

    /// Associated entities that are loaded, for cascading writes.
    pub(crate) fn loaded_targets(&self) -> Vec<EntityRef> {
        match self {
            Self::Reference(loadable) => loadable
                .peek()
                .and_then(|target| (**target).clone())
                .into_iter()
                .collect(),
            Self::Collection(loadable) => loadable
                .peek()
                .map(|items| (**items).clone())
                .unwrap_or_default(),
            Self::Value(_) | Self::Embedded(_) => Vec::new(),
        }
    }
}

/// A property as stored on an instance, inspected without loading it.
#[derive(Debug, Clone)]
pub enum RawProperty {
    /// Never set and never read from the store.
    Absent,
    /// Lazy member whose loader has not run yet.
    Unloaded,
    Value(Arc<Value>),
    Embedded(Option<Embedded>),
    Reference(Option<EntityRef>),
    Collection(Arc<Vec<EntityRef>>),
}

/// An instance of a mapped entity type.
///
/// Holds the id (assigned on first persist, never changed afterwards), the
/// property slots and a dirty flag tracking mutations since the last write
/// or read.
pub struct Entity {
    pub(crate) entity_type: String,
    pub(crate) id: Option<EntityId>,
    pub(crate) properties: BTreeMap<String, Slot>,
    pub(crate) dirty: bool,
    /// Set once the row has been written or read.
    pub(crate) persisted: bool,
}

impl Entity {
    /// Creates a bare, never persisted instance.
    pub fn new(entity_type: &str) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            id: None,
            properties: BTreeMap::new(),
            dirty: false,
            persisted: false,
        }
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn id(&self) -> Option<EntityId> {
        self.id
    }

    /// Returns true if the instance was mutated since it was last persisted
    /// or read.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns true once the instance has been written to or read from the
    /// store.
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Sets the id of an instance that has none yet.
    ///
    /// Setting the id it already has is a no-op; any other id fails with
    /// [`EngineError::IdImmutable`].
    pub fn assign_id(&mut self, id: EntityId) -> EngineResult<()> {
        match self.id {
            Some(current) if current == id => Ok(()),
            Some(current) => Err(EngineError::IdImmutable {
                entity_type: self.entity_type.clone(),
                id: current,
            }),
            None => {
                self.id = Some(id);
                self.dirty = true;
                Ok(())
            }
        }
    }

    /// Reads a scalar property, loading it if lazy. Unset properties read
    /// as [`Value::Null`].
    pub fn get(&self, property: &str) -> EngineResult<Arc<Value>> {
        match self.properties.get(property) {
            None => Ok(Arc::new(Value::Null)),
            Some(Slot::Value(loadable)) => loadable.get(),
            Some(other) => Err(self.member_kind(property, other, "value")),
        }
    }

    pub fn set(&mut self, property: &str, value: impl Into<Value>) {
        self.put(property, Slot::value(value.into()));
    }

    pub fn set_reference(&mut self, property: &str, target: Option<EntityRef>) {
        self.put(property, Slot::Reference(Arc::new(Loadable::ready(target))));
    }

    pub fn set_collection(&mut self, property: &str, items: Vec<EntityRef>) {
        self.put(property, Slot::Collection(Arc::new(Loadable::ready(items))));
    }

    pub fn set_embedded(&mut self, property: &str, value: Option<Embedded>) {
        self.put(property, Slot::Embedded(value));
    }

    /// Inspects a property without triggering a load.
    pub fn raw(&self, property: &str) -> RawProperty {
        match self.properties.get(property) {
            None => RawProperty::Absent,
            Some(Slot::Embedded(value)) => RawProperty::Embedded(value.clone()),
            Some(Slot::Value(l)) => l
                .peek()
                .map_or(RawProperty::Unloaded, |v| RawProperty::Value(Arc::clone(v))),
            Some(Slot::Reference(l)) => l
                .peek()
                .map_or(RawProperty::Unloaded, |r| RawProperty::Reference((**r).clone())),
            Some(Slot::Collection(l)) => l
                .peek()
                .map_or(RawProperty::Unloaded, |c| RawProperty::Collection(Arc::clone(c))),
        }
    }

    /// Names of the properties that hold a slot.
    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    fn put(&mut self, property: &str, slot: Slot) {
        self.properties.insert(property.to_string(), slot);
        self.dirty = true;
    }

    pub(crate) fn slot(&self, property: &str) -> Option<&Slot> {
        self.properties.get(property)
    }

    pub(crate) fn member_kind(
        &self,
        property: &str,
        found: &Slot,
        expected: &'static str,
    ) -> EngineError {
        tracing::trace!(property, found = found.kind(), expected, "member kind mismatch");
        EngineError::MemberKind {
            entity_type: self.entity_type.clone(),
            property: property.to_string(),
            expected,
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Entity");
        s.field("entity_type", &self.entity_type)
            .field("id", &self.id)
            .field("dirty", &self.dirty)
            .field("persisted", &self.persisted);
        for (name, slot) in &self.properties {
            match slot {
                Slot::Value(l) => s.field(name, l),
                Slot::Embedded(e) => s.field(name, e),
                // References print ids only so cyclic graphs terminate.
                Slot::Reference(l) => s.field(
                    name,
                    &l.peek().map(|target| target.iter().map(peek_id).next()),
                ),
                Slot::Collection(l) => s.field(
                    name,
                    &l.peek()
                        .map(|items| items.iter().map(peek_id).collect::<Vec<_>>()),
                ),
            };
        }
        s.finish()
    }
}

fn peek_id(entity: &EntityRef) -> Option<EntityId> {
    entity.0.try_read().and_then(|e| e.id)
}

/// Shared, thread-safe handle to an [`Entity`].
///
/// Handles compare equal when they point at the same type and id; an
/// instance without an id is only equal to itself.
#[derive(Clone)]
pub struct EntityRef(Arc<RwLock<Entity>>);

impl EntityRef {
    pub fn new(entity: Entity) -> Self {
        Self(Arc::new(RwLock::new(entity)))
    }

    /// Returns true if both handles point at the same instance.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Entity> {
        self.0.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Entity> {
        self.0.write()
    }

    pub fn entity_type(&self) -> String {
        self.0.read().entity_type.clone()
    }

    pub fn id(&self) -> Option<EntityId> {
        self.0.read().id
    }

    pub fn is_dirty(&self) -> bool {
        self.0.read().dirty
    }

    pub fn is_persisted(&self) -> bool {
        self.0.read().persisted
    }

    pub fn assign_id(&self, id: EntityId) -> EngineResult<()> {
        self.0.write().assign_id(id)
    }

    // ── Accessors ────────────────────────────────────────────────

    /// Reads a scalar property, loading it if lazy.
    pub fn get(&self, property: &str) -> EngineResult<Arc<Value>> {
        let loadable = {
            let entity = self.0.read();
            match entity.slot(property) {
                None => return Ok(Arc::new(Value::Null)),
                Some(Slot::Value(l)) => Arc::clone(l),
                Some(other) => return Err(entity.member_kind(property, other, "value")),
            }
        };
        loadable.get()
    }

    pub fn get_str(&self, property: &str) -> EngineResult<Option<String>> {
        Ok(self.get(property)?.as_str().map(str::to_string))
    }

    pub fn get_i64(&self, property: &str) -> EngineResult<Option<i64>> {
        Ok(self.get(property)?.as_i64())
    }

    pub fn get_f64(&self, property: &str) -> EngineResult<Option<f64>> {
        Ok(self.get(property)?.as_f64())
    }

    pub fn get_bool(&self, property: &str) -> EngineResult<Option<bool>> {
        Ok(self.get(property)?.as_bool())
    }

    pub fn get_timestamp(&self, property: &str) -> EngineResult<Option<Timestamp>> {
        Ok(self.get(property)?.as_timestamp())
    }

    pub fn get_enum<E: ColumnEnum>(&self, property: &str) -> EngineResult<Option<E>> {
        Ok(self.get(property)?.as_enum())
    }

    /// Reads a reference, loading the target if lazy.
    pub fn reference(&self, property: &str) -> EngineResult<Option<EntityRef>> {
        let loadable = {
            let entity = self.0.read();
            match entity.slot(property) {
                None => return Ok(None),
                Some(Slot::Reference(l)) => Arc::clone(l),
                Some(other) => return Err(entity.member_kind(property, other, "reference")),
            }
        };
        let target = loadable.get()?;
        Ok((*target).clone())
    }

    /// Reads a collection, loading its members if lazy. Unset collections
    /// are empty.
    pub fn collection(&self, property: &str) -> EngineResult<Arc<Vec<EntityRef>>> {
        let loadable = {
            let entity = self.0.read();
            match entity.slot(property) {
                None => return Ok(Arc::new(Vec::new())),
                Some(Slot::Collection(l)) => Arc::clone(l),
                Some(other) => return Err(entity.member_kind(property, other, "collection")),
            }
        };
        loadable.get()
    }

    pub fn embedded(&self, property: &str) -> EngineResult<Option<Embedded>> {
        let entity = self.0.read();
        match entity.slot(property) {
            None => Ok(None),
            Some(Slot::Embedded(value)) => Ok(value.clone()),
            Some(other) => Err(entity.member_kind(property, other, "embedded value")),
        }
    }

    pub fn raw(&self, property: &str) -> RawProperty {
        self.0.read().raw(property)
    }

    // ── Setters ──────────────────────────────────────────────────

    pub fn set(&self, property: &str, value: impl Into<Value>) {
        self.0.write().set(property, value);
    }

    pub fn set_reference(&self, property: &str, target: Option<EntityRef>) {
        self.0.write().set_reference(property, target);
    }

    pub fn set_collection(&self, property: &str, items: Vec<EntityRef>) {
        self.0.write().set_collection(property, items);
    }

    pub fn set_embedded(&self, property: &str, value: Option<Embedded>) {
        self.0.write().set_embedded(property, value);
    }

    /// Address of the shared instance, used to track visited nodes.
    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        if Self::ptr_eq(self, other) {
            return true;
        }
        let (a_type, a_id) = {
            let a = self.0.read();
            (a.entity_type.clone(), a.id)
        };
        let b = other.0.read();
        match (a_id, b.id) {
            (Some(a_id), Some(b_id)) => a_id == b_id && a_type == b.entity_type,
            _ => false,
        }
    }
}

impl Eq for EntityRef {}

impl fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_read() {
            Some(entity) => entity.fmt(f),
            None => f.write_str("EntityRef(<locked>)"),
        }
    }
}
