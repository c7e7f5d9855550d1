//! Column store collaborator for Firebrand.
//!
//! The mapping engine never talks to a cluster directly; it goes through the
//! [`ColumnStore`] trait:
//!
//! - Row-level reads and column-level upserts addressed by family and key
//! - Native statement execution returning raw rows or an aggregate scalar
//! - A consistency level passed through on every call
//!
//! [`MemoryStore`] is a complete in-process implementation that executes the
//! native query language, used for tests and embedded setups.

mod error;
mod memory;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;

use firebrand_types::{ColumnValue, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Replica acknowledgement level requested for a read or write.
///
/// Opaque to the engine; stores that have no replicas ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsistencyLevel {
    #[default]
    One,
    Quorum,
    All,
    Any,
    LocalQuorum,
    EachQuorum,
}

/// Outcome of executing a native statement.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// Matching rows in store key order.
    Rows(Vec<Row>),
    /// A single aggregate value such as `COUNT(*)`.
    Scalar(ColumnValue),
    /// Updates and deletes.
    Void,
}

impl QueryResult {
    /// Returns the rows, or an empty slice for scalar and void results.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        match self {
            Self::Rows(rows) => rows,
            Self::Scalar(_) | Self::Void => &[],
        }
    }
}

/// Row read/write and statement execution against a wide-column store.
pub trait ColumnStore: Send + Sync {
    /// Reads every column of a row. Returns `None` when the row does not
    /// exist or has no columns left.
    fn read_row(
        &self,
        family: &str,
        key: &str,
        consistency: ConsistencyLevel,
    ) -> StorageResult<Option<Row>>;

    /// Reads only the named columns of a row.
    fn read_columns(
        &self,
        family: &str,
        key: &str,
        columns: &[&str],
        consistency: ConsistencyLevel,
    ) -> StorageResult<Option<Row>> {
        Ok(self.read_row(family, key, consistency)?.map(|mut row| {
            row.columns.retain(|name, _| columns.contains(&name.as_str()));
            row
        }))
    }

    /// Upserts columns. `Counter` values are deltas merged into the stored
    /// total; everything else overwrites.
    fn write_columns(
        &self,
        family: &str,
        key: &str,
        columns: BTreeMap<String, ColumnValue>,
        consistency: ConsistencyLevel,
    ) -> StorageResult<()>;

    fn delete_row(
        &self,
        family: &str,
        key: &str,
        consistency: ConsistencyLevel,
    ) -> StorageResult<()>;

    /// Executes native statement text.
    fn execute(&self, statement: &str, consistency: ConsistencyLevel)
    -> StorageResult<QueryResult>;
}
