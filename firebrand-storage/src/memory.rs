//! In-process column store.

use crate::{ColumnStore, ConsistencyLevel, QueryResult, StorageError, StorageResult};
use firebrand_cql::{
    AssignOp, CqlError, DeleteStatement, Operator, Projection, Relation, SelectStatement,
    Statement, Subject, Term, UpdateStatement,
};
use firebrand_types::{ColumnValue, Row};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use tracing::trace;

type Family = BTreeMap<String, Row>;

/// A column store held entirely in memory.
///
/// Rows in a family are kept in key order, which is also the order range
/// scans and listings return them in. Safe for concurrent use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    families: RwLock<HashMap<String, Family>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a store from a JSON snapshot: `{ "family": [row, ...], ... }`.
    pub fn from_json(json: &str) -> StorageResult<Self> {
        let snapshot: BTreeMap<String, Vec<Row>> = serde_json::from_str(json)?;
        let families = snapshot
            .into_iter()
            .map(|(name, rows)| {
                let rows = rows
                    .into_iter()
                    .filter(|row| !row.is_empty())
                    .map(|row| (row.key.clone(), row))
                    .collect();
                (name, rows)
            })
            .collect();
        Ok(Self {
            families: RwLock::new(families),
        })
    }

    /// Dumps every family as a JSON snapshot readable by [`Self::from_json`].
    pub fn to_json(&self) -> StorageResult<String> {
        let families = self.families.read();
        let snapshot: BTreeMap<&str, Vec<&Row>> = families
            .iter()
            .map(|(name, rows)| (name.as_str(), rows.values().collect()))
            .collect();
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// Number of rows stored in a family.
    #[must_use]
    pub fn row_count(&self, family: &str) -> usize {
        self.families.read().get(family).map_or(0, BTreeMap::len)
    }

    fn select(&self, statement: &SelectStatement) -> QueryResult {
        let families = self.families.read();
        let limit = statement
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
        let matching = families
            .get(&statement.family)
            .into_iter()
            .flat_map(|rows| rows.values())
            .filter(|row| !row.is_empty() && matches_all(row, &statement.relations))
            .take(limit);

        match &statement.projection {
            Projection::Count => {
                let count = matching.count();
                QueryResult::Scalar(ColumnValue::Long(i64::try_from(count).unwrap_or(i64::MAX)))
            }
            Projection::All => QueryResult::Rows(matching.cloned().collect()),
            Projection::Columns(columns) => QueryResult::Rows(
                matching
                    .map(|row| {
                        let mut projected = Row::new(row.key.clone());
                        for column in columns {
                            if let Some(value) = row.get(column) {
                                projected.columns.insert(column.clone(), value.clone());
                            }
                        }
                        projected
                    })
                    .collect(),
            ),
        }
    }

    fn update(&self, statement: &UpdateStatement) -> StorageResult<QueryResult> {
        let keys = target_keys(&statement.relations)?;
        let mut families = self.families.write();
        let family = families.entry(statement.family.clone()).or_default();
        for key in keys {
            let row = family.entry(key.clone()).or_insert_with(|| Row::new(key));
            for assignment in &statement.assignments {
                let value = match &assignment.operation {
                    AssignOp::Set(term) => bound(term)?.clone(),
                    AssignOp::Increment(by) => {
                        merge_counter(&assignment.column, row.get(&assignment.column), *by)?
                    }
                };
                row.columns.insert(assignment.column.clone(), value);
            }
        }
        Ok(QueryResult::Void)
    }

    fn delete(&self, statement: &DeleteStatement) -> StorageResult<QueryResult> {
        let keys = target_keys(&statement.relations)?;
        let mut families = self.families.write();
        let Some(family) = families.get_mut(&statement.family) else {
            return Ok(QueryResult::Void);
        };
        for key in keys {
            if statement.columns.is_empty() {
                family.remove(&key);
                continue;
            }
            if let Some(row) = family.get_mut(&key) {
                for column in &statement.columns {
                    row.columns.remove(column);
                }
                if row.is_empty() {
                    family.remove(&key);
                }
            }
        }
        Ok(QueryResult::Void)
    }
}

impl ColumnStore for MemoryStore {
    fn read_row(
        &self,
        family: &str,
        key: &str,
        _consistency: ConsistencyLevel,
    ) -> StorageResult<Option<Row>> {
        trace!(family, key, "read row");
        Ok(self
            .families
            .read()
            .get(family)
            .and_then(|rows| rows.get(key))
            .filter(|row| !row.is_empty())
            .cloned())
    }

    fn write_columns(
        &self,
        family: &str,
        key: &str,
        columns: BTreeMap<String, ColumnValue>,
        _consistency: ConsistencyLevel,
    ) -> StorageResult<()> {
        trace!(family, key, columns = columns.len(), "write columns");
        let mut families = self.families.write();
        let row = families
            .entry(family.to_string())
            .or_default()
            .entry(key.to_string())
            .or_insert_with(|| Row::new(key));
        for (name, value) in columns {
            let value = match value {
                ColumnValue::Counter(delta) => merge_counter(&name, row.get(&name), delta)?,
                other => other,
            };
            row.columns.insert(name, value);
        }
        Ok(())
    }

    fn delete_row(
        &self,
        family: &str,
        key: &str,
        _consistency: ConsistencyLevel,
    ) -> StorageResult<()> {
        trace!(family, key, "delete row");
        if let Some(rows) = self.families.write().get_mut(family) {
            rows.remove(key);
        }
        Ok(())
    }

    fn execute(
        &self,
        statement: &str,
        _consistency: ConsistencyLevel,
    ) -> StorageResult<QueryResult> {
        trace!(statement, "execute");
        let parsed = firebrand_cql::parse(statement)?;
        if let Some(name) = parsed.placeholders().into_iter().next() {
            return Err(CqlError::UnboundParameter(name).into());
        }
        match &parsed {
            Statement::Select(select) => Ok(self.select(select)),
            Statement::Update(update) => self.update(update),
            Statement::Delete(delete) => self.delete(delete),
        }
    }
}

fn matches_all(row: &Row, relations: &[Relation]) -> bool {
    relations.iter().all(|relation| matches(row, relation))
}

fn matches(row: &Row, relation: &Relation) -> bool {
    let key;
    let subject = match &relation.subject {
        Subject::Key => {
            key = ColumnValue::Text(row.key.clone());
            &key
        }
        Subject::Column(column) => match row.get(column) {
            Some(value) => value,
            None => return false,
        },
    };
    let mut terms = relation.terms.iter().filter_map(Term::literal);
    let satisfies = |term: &ColumnValue| {
        subject
            .compare(term)
            .is_some_and(|ordering| relation.operator.accepts(ordering))
    };
    match relation.operator {
        Operator::In => terms.any(satisfies),
        _ => terms.next().is_some_and(satisfies),
    }
}

/// Row keys addressed by an update or delete's `KEY =` / `KEY IN` relation.
fn target_keys(relations: &[Relation]) -> StorageResult<Vec<String>> {
    let relation = relations
        .iter()
        .find(|r| r.subject == Subject::Key && matches!(r.operator, Operator::Eq | Operator::In))
        .ok_or_else(|| StorageError::Unsupported("writes must address rows by key".into()))?;
    relation
        .terms
        .iter()
        .map(|term| match bound(term)? {
            ColumnValue::Text(key) => Ok(key.clone()),
            other => Err(StorageError::InvalidData(format!(
                "row key must be text, found {}",
                other.kind_name()
            ))),
        })
        .collect()
}

fn bound(term: &Term) -> StorageResult<&ColumnValue> {
    match term {
        Term::Literal(value) => Ok(value),
        Term::Placeholder(name) => Err(CqlError::UnboundParameter(name.clone()).into()),
    }
}

fn merge_counter(
    column: &str,
    existing: Option<&ColumnValue>,
    delta: i64,
) -> StorageResult<ColumnValue> {
    let total = match existing {
        None => 0,
        Some(value) => value.integral().ok_or_else(|| {
            StorageError::InvalidData(format!(
                "cannot increment {column}: stored value is {}",
                value.kind_name()
            ))
        })?,
    };
    Ok(ColumnValue::Counter(total.wrapping_add(delta)))
}
