//! Persistence engine for Firebrand.
//!
//! The [`EntityFactory`] writes object graphs into column rows and
//! materializes them back:
//!
//! - Persisting assigns ids, cascades into unsaved or modified associated
//!   entities and writes column-level upserts
//! - Reading decodes eager members immediately and installs deferred
//!   loaders ([`Loadable`]) for lazy ones
//! - Cyclic graphs are handled with per-operation contexts: a visited set
//!   on writes, an id-to-instance map on reads
//! - Counter entities write increments and read back merged totals
//!
//! Instances are shared through [`EntityRef`] handles; equality is by type
//! and id and never walks associations.
//!
//! ```ignore
//! let factory = EntityFactory::builder(registry).build(Arc::new(MemoryStore::new()))?;
//! let user = factory.new_instance("User")?;
//! user.set("name", "ada");
//! factory.persist(&user)?;
//! let loaded = factory.get("User", &user.id().unwrap())?;
//! ```

mod config;
mod context;
mod entity;
mod error;
mod factory;
mod listener;
mod loadable;
mod read;
mod result;
mod write;

pub use config::FactoryConfig;
pub use entity::{Entity, EntityRef, RawProperty};
pub use error::{EngineError, EngineResult};
pub use factory::{EntityFactory, EntityFactoryBuilder};
pub use listener::EntityListener;
pub use loadable::Loadable;
pub use result::SingleResult;
