//! Per-operation bookkeeping.
//!
//! Contexts live for one factory call and are dropped when it returns, so
//! nothing is cached across operations.

use crate::EntityRef;
use firebrand_types::EntityId;
use std::collections::{HashMap, HashSet};

/// Instances already written (or being written) by one persist.
#[derive(Default)]
pub(crate) struct PersistContext {
    visited: HashSet<usize>,
}

impl PersistContext {
    /// Marks `entity` as visited. Returns false if it already was.
    pub(crate) fn enter(&mut self, entity: &EntityRef) -> bool {
        self.visited.insert(entity.addr())
    }
}

/// Instances materialized by one read, keyed by column family and id.
///
/// A handle is registered before its members are decoded, so references
/// back to it resolve to the same in-progress instance.
#[derive(Default)]
pub(crate) struct LoadContext {
    loaded: HashMap<(String, EntityId), EntityRef>,
}

impl LoadContext {
    pub(crate) fn get(&self, family: &str, id: &EntityId) -> Option<EntityRef> {
        self.loaded.get(&(family.to_string(), *id)).cloned()
    }

    pub(crate) fn insert(&mut self, family: &str, id: EntityId, entity: EntityRef) {
        self.loaded.insert((family.to_string(), id), entity);
    }

    pub(crate) fn len(&self) -> usize {
        self.loaded.len()
    }
}
