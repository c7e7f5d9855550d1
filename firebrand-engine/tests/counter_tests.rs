mod common;

use common::factory;
use firebrand_engine::{EngineError, EntityFactory, EntityRef};
use firebrand_query::Query;
use firebrand_storage::{ColumnStore, ConsistencyLevel};
use firebrand_types::ColumnValue;
use pretty_assertions::assert_eq;

fn counter(factory: &EntityFactory, increase_by: i64) -> EntityRef {
    let entity = factory.new_instance("FirstEntityCounter").unwrap();
    entity.set("counterPropertyIncreaseBy", increase_by);
    entity
}

fn total(factory: &EntityFactory, entity: &EntityRef) -> Option<i64> {
    factory
        .get("FirstEntityCounter", &entity.id().unwrap())
        .unwrap()
        .unwrap()
        .get_i64("counterProperty")
        .unwrap()
}

// ── Increments ───────────────────────────────────────────────────

#[test]
fn first_persist_writes_initial_value_plus_delta() {
    let (factory, _store) = factory();
    let entity = counter(&factory, 2);
    entity.set("counterProperty", 10_i64);
    factory.persist(&entity).unwrap();

    assert_eq!(entity.get_i64("counterPropertyIncreaseBy").unwrap(), Some(0));
    let loaded = factory
        .get("FirstEntityCounter", &entity.id().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(loaded.get_i64("counterProperty").unwrap(), Some(12));
    assert_eq!(loaded.get_i64("counterPropertyIncreaseBy").unwrap(), Some(0));
}

#[test]
fn later_persists_ignore_the_in_memory_total() {
    let (factory, _store) = factory();
    let entity = counter(&factory, 2);
    entity.set("counterProperty", 10_i64);
    factory.persist(&entity).unwrap();

    entity.set("counterProperty", 1_000_i64);
    entity.set("counterPropertyIncreaseBy", 1_i64);
    factory.persist(&entity).unwrap();
    assert_eq!(total(&factory, &entity), Some(13));
}

#[test]
fn caller_assigned_id_still_counts_as_a_first_write() {
    let (factory, _store) = factory();
    let entity = counter(&factory, 1);
    entity.set("counterProperty", 5_i64);
    entity.assign_id(firebrand_types::EntityId::new()).unwrap();
    factory.persist(&entity).unwrap();
    assert!(entity.is_persisted());
    assert_eq!(total(&factory, &entity), Some(6));
}

#[test]
fn text_in_a_counter_property_fails_the_persist() {
    let (factory, _store) = factory();
    let entity = counter(&factory, 0);
    entity.set("counterPropertyIncreaseBy", "two");
    assert!(matches!(factory.persist(&entity), Err(EngineError::Codec(_))));
}

#[test]
fn repeated_persists_accumulate() {
    let (factory, _store) = factory();
    let entity = counter(&factory, 2);
    factory.persist(&entity).unwrap();

    entity.set("counterPropertyIncreaseBy", 3_i64);
    factory.persist(&entity).unwrap();
    assert_eq!(total(&factory, &entity), Some(5));

    entity.set("counterPropertyIncreaseBy", -4_i64);
    factory.persist(&entity).unwrap();
    assert_eq!(total(&factory, &entity), Some(1));
}

#[test]
fn persist_without_delta_leaves_total_unchanged() {
    let (factory, _store) = factory();
    let entity = counter(&factory, 7);
    factory.persist(&entity).unwrap();
    factory.persist(&entity).unwrap();
    assert_eq!(total(&factory, &entity), Some(7));

    let loaded = factory
        .get("FirstEntityCounter", &entity.id().unwrap())
        .unwrap()
        .unwrap();
    factory.persist(&loaded).unwrap();
    assert_eq!(total(&factory, &entity), Some(7));
}

#[test]
fn counter_row_has_no_discriminator() {
    let (factory, store) = factory();
    let entity = counter(&factory, 3);
    factory.persist(&entity).unwrap();

    let row = store
        .read_row(
            "FirstEntityCounter",
            &entity.id().unwrap().to_key(),
            ConsistencyLevel::One,
        )
        .unwrap()
        .unwrap();
    assert_eq!(row.get("counterProperty"), Some(&ColumnValue::Counter(3)));
    assert_eq!(row.get("__type"), None);
}

#[test]
fn unwritten_counter_reads_as_zero() {
    let (factory, _store) = factory();
    let entity = factory.new_instance("FirstEntityCounter").unwrap();
    factory.persist(&entity).unwrap();
    assert_eq!(total(&factory, &entity), Some(0));
}

// ── Mapped counters ──────────────────────────────────────────────

#[test]
fn mapped_counter_is_cascaded() {
    let (factory, store) = factory();
    let entity = counter(&factory, 4);
    let owner = factory.new_instance("FirstEntity").unwrap();
    owner.set("name", "owner");
    owner.set_reference("counter", Some(entity.clone()));
    factory.persist(&owner).unwrap();
    assert_eq!(store.row_count("FirstEntityCounter"), 1);

    let loaded = factory
        .get("FirstEntity", &owner.id().unwrap())
        .unwrap()
        .unwrap();
    let mapped = loaded.reference("counter").unwrap().unwrap();
    assert_eq!(mapped.get_i64("counterProperty").unwrap(), Some(4));

    mapped.set("counterPropertyIncreaseBy", 6_i64);
    factory.persist(&loaded).unwrap();
    assert_eq!(total(&factory, &entity), Some(10));
}

// ── Statements ───────────────────────────────────────────────────

#[test]
fn increment_statement_adds_to_the_total() {
    let (factory, _store) = factory();
    let entity = counter(&factory, 1);
    factory.persist(&entity).unwrap();

    factory
        .execute_query(
            Query::update("FirstEntityCounter")
                .increment("counterProperty", 4)
                .key(entity.id().unwrap()),
        )
        .unwrap();
    assert_eq!(total(&factory, &entity), Some(5));
}

#[test]
fn increment_of_a_plain_column_is_rejected() {
    let (factory, _store) = factory();
    let err = factory
        .execute_query(
            Query::update("FirstEntity")
                .increment("phone", 1)
                .key(firebrand_types::EntityId::new()),
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::Query(_)));
}
