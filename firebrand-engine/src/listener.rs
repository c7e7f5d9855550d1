use crate::Entity;

/// Lifecycle callbacks for one entity type, registered on the factory
/// builder.
///
/// Both hooks default to no-ops, so a listener only implements the ones it
/// needs, e.g.:
/// - Filling audit or derived properties before the first write
/// - Validation that rejects a write
/// - Post-load enrichment of transient properties
pub trait EntityListener: Send + Sync {
    /// Called once, on the first persist of an instance, after its id has
    /// been assigned and before anything is written.
    /// Return `Err(message)` to reject the write.
    fn pre_persist(&self, entity: &mut Entity) -> Result<(), String> {
        let _ = entity;
        Ok(())
    }

    /// Called after an instance has been materialized from its row, before
    /// it is returned to the caller.
    fn post_load(&self, entity: &mut Entity) {
        let _ = entity;
    }
}
