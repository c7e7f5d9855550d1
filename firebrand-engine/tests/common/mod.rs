//! Shared fixtures: a schema with every kind of member and a factory over
//! a fresh in-memory store.

#![allow(dead_code)]

use firebrand_engine::{Entity, EntityFactory, EntityListener};
use firebrand_model::{
    AssociationDescriptor, ColumnDescriptor, EmbeddableDescriptor, EntityDescriptor, Registry,
};
use firebrand_storage::{
    ColumnStore, ConsistencyLevel, MemoryStore, QueryResult, StorageResult,
};
use firebrand_types::{ColumnEnum, ColumnValue, Row, Timestamp};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const QUERY_ALL_ENTITIES: &str = "FirstEntity.all";
pub const QUERY_ALL_ENTITIES_WITH_PARAMS: &str = "FirstEntity.byKey";
pub const PRE_PERSIST_VALUE: &str = "set before first write";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestEnum {
    A,
    B,
    C,
}

impl ColumnEnum for TestEnum {
    fn variants() -> &'static [&'static str] {
        &["A", "B", "C"]
    }

    fn name(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            _ => None,
        }
    }
}

pub fn registry() -> Registry {
    Registry::builder()
        .entity(
            EntityDescriptor::new("FirstEntity")
                .id("id")
                .column(ColumnDescriptor::text("name").indexed())
                .column(ColumnDescriptor::text("description").indexed())
                .column(ColumnDescriptor::text("hugeDescription").lazy())
                .column(ColumnDescriptor::long("phone").indexed())
                .column(ColumnDescriptor::double("score").indexed())
                .column(ColumnDescriptor::timestamp("date").indexed())
                .column(ColumnDescriptor::timestamp("otherDate"))
                .column(ColumnDescriptor::text("changedColumnName").column_name("changed_name"))
                .column(ColumnDescriptor::enumeration("testEnum", TestEnum::variants()))
                .column(ColumnDescriptor::bytes("someBytes"))
                .column(ColumnDescriptor::serialized("listSerializedAsBytes"))
                .column(ColumnDescriptor::text("prePersistProperty"))
                .association(AssociationDescriptor::embedded("otherEntity", "OtherEntity"))
                .association(AssociationDescriptor::reference("mappedEntity", "SecondEntity"))
                .association(
                    AssociationDescriptor::reference("secondLazyMappedEntity", "SecondEntity")
                        .lazy(),
                )
                .association(AssociationDescriptor::collection("listProperty", "SecondEntity").lazy())
                .association(AssociationDescriptor::collection(
                    "secondEagerListProperty",
                    "SecondEntity",
                ))
                .association(AssociationDescriptor::reference("counter", "FirstEntityCounter"))
                .named_query(QUERY_ALL_ENTITIES, "SELECT * FROM FirstEntity")
                .named_query(
                    QUERY_ALL_ENTITIES_WITH_PARAMS,
                    "SELECT * FROM FirstEntity WHERE KEY = :key",
                ),
        )
        .entity(
            EntityDescriptor::new("SecondEntity")
                .id("id")
                .column(ColumnDescriptor::text("name"))
                .association(AssociationDescriptor::reference("mappedFirstEntity", "FirstEntity"))
                .association(AssociationDescriptor::reference("recursiveMapped", "SecondEntity"))
                .association(AssociationDescriptor::embedded(
                    "embedEntityInRecursiveMappedEntity",
                    "ThirdEntity",
                )),
        )
        .entity(
            EntityDescriptor::new("FirstEntityCounter")
                .id("id")
                .counter()
                .column(ColumnDescriptor::counter(
                    "counterProperty",
                    "counterPropertyIncreaseBy",
                )),
        )
        .embeddable(
            EmbeddableDescriptor::new("OtherEntity")
                .column(ColumnDescriptor::text("firstProperty"))
                .column(ColumnDescriptor::text("nullProperty"))
                .embed("nestedThirdProperty", "ThirdEntity"),
        )
        .embeddable(
            EmbeddableDescriptor::new("ThirdEntity")
                .column(ColumnDescriptor::text("someProperty"))
                .embed("fourthEntity", "FourthEntity")
                .embed("fourthEntityNull", "FourthEntity"),
        )
        .embeddable(
            EmbeddableDescriptor::new("FourthEntity").column(ColumnDescriptor::text("someProperty")),
        )
        .build()
        .expect("fixture schema is valid")
}

/// Fills `prePersistProperty` on the first write of a `FirstEntity`.
pub struct PrePersistListener;

impl EntityListener for PrePersistListener {
    fn pre_persist(&self, entity: &mut Entity) -> Result<(), String> {
        entity.set("prePersistProperty", PRE_PERSIST_VALUE);
        Ok(())
    }
}

/// A factory over an empty store, plus the store for direct inspection.
pub fn factory() -> (EntityFactory, Arc<MemoryStore>) {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let factory = EntityFactory::builder(registry())
        .listener("FirstEntity", PrePersistListener)
        .build(store.clone())
        .expect("factory builds");
    (factory, store)
}

/// One call received by a [`RecordingStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub op: &'static str,
    pub target: String,
    pub consistency: ConsistencyLevel,
}

/// Wraps a [`MemoryStore`] and records every call made to it.
#[derive(Debug, Default)]
pub struct RecordingStore {
    pub inner: MemoryStore,
    calls: Mutex<Vec<Call>>,
}

impl RecordingStore {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    /// Calls with the given operation name.
    pub fn count(&self, op: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.op == op).count()
    }

    fn record(&self, op: &'static str, target: &str, consistency: ConsistencyLevel) {
        self.calls.lock().push(Call {
            op,
            target: target.to_string(),
            consistency,
        });
    }
}

impl ColumnStore for RecordingStore {
    fn read_row(&self, family: &str, key: &str, c: ConsistencyLevel) -> StorageResult<Option<Row>> {
        self.record("read_row", family, c);
        self.inner.read_row(family, key, c)
    }

    fn read_columns(
        &self,
        family: &str,
        key: &str,
        columns: &[&str],
        c: ConsistencyLevel,
    ) -> StorageResult<Option<Row>> {
        self.record("read_columns", family, c);
        self.inner.read_columns(family, key, columns, c)
    }

    fn write_columns(
        &self,
        family: &str,
        key: &str,
        columns: BTreeMap<String, ColumnValue>,
        c: ConsistencyLevel,
    ) -> StorageResult<()> {
        self.record("write_columns", family, c);
        self.inner.write_columns(family, key, columns, c)
    }

    fn delete_row(&self, family: &str, key: &str, c: ConsistencyLevel) -> StorageResult<()> {
        self.record("delete_row", family, c);
        self.inner.delete_row(family, key, c)
    }

    fn execute(&self, statement: &str, c: ConsistencyLevel) -> StorageResult<QueryResult> {
        self.record("execute", statement, c);
        self.inner.execute(statement, c)
    }
}

/// Same schema and listener as [`factory`], over a recording store.
pub fn recording_factory() -> (EntityFactory, Arc<RecordingStore>) {
    init_tracing();
    let store = Arc::new(RecordingStore::default());
    let factory = EntityFactory::builder(registry())
        .listener("FirstEntity", PrePersistListener)
        .build(store.clone())
        .expect("factory builds");
    (factory, store)
}

/// A fresh random string.
pub fn rds() -> String {
    firebrand_types::EntityId::new().to_key()
}

pub fn now() -> Timestamp {
    Timestamp::now()
}

/// Installs a log subscriber honouring `RUST_LOG`; repeated calls are
/// harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
