//! Mapping metadata for Firebrand.
//!
//! Declares how domain types map onto column families:
//! - [`EntityDescriptor`]: one per entity type with id, columns, associations,
//!   named queries, counter flag
//! - [`ColumnDescriptor`] / [`ColumnKind`]: scalar properties and their codecs
//! - [`AssociationDescriptor`]: embedded values, references and collections
//! - [`EmbeddableDescriptor`] / [`Embedded`]: value objects stored inline
//! - [`Registry`]: the validated, immutable set of descriptors
//!
//! Descriptors are plain data (serde-enabled) so a schema can be declared in
//! code through the builders or loaded from a JSON document.

mod descriptor;
mod embedded;
mod error;
mod registry;

pub use descriptor::{
    AssociationDescriptor, AssociationKind, ColumnDescriptor, ColumnKind, EmbeddableDescriptor,
    EntityDescriptor, FetchMode, NamedQuery,
};
pub use embedded::Embedded;
pub use error::{MappingError, MappingResult};
pub use registry::{RegisteredQuery, Registry, RegistryBuilder, SchemaDocument};

/// Discriminator column holding the entity type name of each row.
pub const TYPE_COLUMN: &str = "__type";

/// Name of the column holding `column` of an embedded value stored under
/// `prefix`.
#[must_use]
pub fn nested_column(prefix: &str, column: &str) -> String {
    format!("{prefix}.{column}")
}
