mod common;

use common::{factory, recording_factory};
use firebrand_engine::{EntityFactory, EntityRef, RawProperty};
use firebrand_storage::{ColumnStore, ConsistencyLevel};
use firebrand_types::ColumnValue;
use pretty_assertions::assert_eq;

fn second(factory: &EntityFactory, name: &str) -> EntityRef {
    let entity = factory.new_instance("SecondEntity").unwrap();
    entity.set("name", name);
    entity
}

/// A `FirstEntity` with every lazy member filled, persisted.
fn persisted_owner(factory: &EntityFactory) -> EntityRef {
    let owner = factory.new_instance("FirstEntity").unwrap();
    owner.set("name", "owner");
    owner.set("hugeDescription", "a very long text");
    owner.set_reference("secondLazyMappedEntity", Some(second(factory, "lazy")));
    owner.set_reference("mappedEntity", Some(second(factory, "eager")));
    owner.set_collection(
        "listProperty",
        vec![second(factory, "l1"), second(factory, "l2"), second(factory, "l3")],
    );
    factory.persist(&owner).unwrap();
    owner
}

fn reload(factory: &EntityFactory, entity: &EntityRef) -> EntityRef {
    factory
        .get("FirstEntity", &entity.id().unwrap())
        .unwrap()
        .unwrap()
}

// ── Lazy columns ─────────────────────────────────────────────────

#[test]
fn lazy_column_is_unloaded_until_read() {
    let (factory, _store) = factory();
    let loaded = reload(&factory, &persisted_owner(&factory));

    assert!(matches!(loaded.raw("hugeDescription"), RawProperty::Unloaded));
    assert_eq!(
        loaded.get_str("hugeDescription").unwrap().as_deref(),
        Some("a very long text")
    );
    assert!(matches!(
        loaded.raw("hugeDescription"),
        RawProperty::Value(ref v) if v.as_str() == Some("a very long text")
    ));
    assert!(!loaded.is_dirty());
}

#[test]
fn lazy_column_reads_only_its_own_column() {
    let (factory, store) = recording_factory();
    let loaded = reload(&factory, &persisted_owner(&factory));
    store.clear();

    loaded.get("hugeDescription").unwrap();
    loaded.get("hugeDescription").unwrap();
    assert_eq!(store.count("read_columns"), 1);
    assert_eq!(store.calls().len(), 1);
}

#[test]
fn absent_lazy_column_loads_as_null() {
    let (factory, _store) = factory();
    let entity = factory.new_instance("FirstEntity").unwrap();
    factory.persist(&entity).unwrap();

    let loaded = reload(&factory, &entity);
    assert!(matches!(loaded.raw("hugeDescription"), RawProperty::Unloaded));
    assert!(loaded.get("hugeDescription").unwrap().is_null());
}

#[test]
fn unloaded_lazy_column_survives_a_rewrite() {
    let (factory, store) = factory();
    let owner = persisted_owner(&factory);
    let loaded = reload(&factory, &owner);

    loaded.set("name", "renamed");
    factory.persist(&loaded).unwrap();
    assert!(matches!(loaded.raw("hugeDescription"), RawProperty::Unloaded));

    let row = store
        .read_row("FirstEntity", &owner.id().unwrap().to_key(), ConsistencyLevel::One)
        .unwrap()
        .unwrap();
    assert_eq!(
        row.get("hugeDescription"),
        Some(&ColumnValue::Text("a very long text".into()))
    );
    assert_eq!(row.get("name"), Some(&ColumnValue::Text("renamed".into())));
}

#[test]
fn freshly_set_value_replaces_an_unloaded_one() {
    let (factory, store) = recording_factory();
    let loaded = reload(&factory, &persisted_owner(&factory));
    store.clear();

    loaded.set("hugeDescription", "short");
    assert_eq!(loaded.get_str("hugeDescription").unwrap().as_deref(), Some("short"));
    assert_eq!(store.count("read_columns"), 0);
}

// ── Lazy references ──────────────────────────────────────────────

#[test]
fn lazy_reference_loads_on_first_access() {
    let (factory, store) = recording_factory();
    let loaded = reload(&factory, &persisted_owner(&factory));

    assert!(matches!(loaded.raw("secondLazyMappedEntity"), RawProperty::Unloaded));
    assert!(matches!(
        loaded.raw("mappedEntity"),
        RawProperty::Reference(Some(_))
    ));

    store.clear();
    let target = loaded.reference("secondLazyMappedEntity").unwrap().unwrap();
    assert_eq!(target.get_str("name").unwrap().as_deref(), Some("lazy"));
    assert_eq!(store.count("read_row"), 1);

    let again = loaded.reference("secondLazyMappedEntity").unwrap().unwrap();
    assert!(EntityRef::ptr_eq(&target, &again));
    assert_eq!(store.count("read_row"), 1);
    assert!(matches!(
        loaded.raw("secondLazyMappedEntity"),
        RawProperty::Reference(Some(ref r)) if EntityRef::ptr_eq(r, &target)
    ));
}

#[test]
fn eager_reference_is_the_same_instance_on_every_access() {
    let (factory, _store) = factory();
    let loaded = reload(&factory, &persisted_owner(&factory));

    let a = loaded.reference("mappedEntity").unwrap().unwrap();
    let b = loaded.reference("mappedEntity").unwrap().unwrap();
    assert!(EntityRef::ptr_eq(&a, &b));
    assert_eq!(a.get_str("name").unwrap().as_deref(), Some("eager"));
}

#[test]
fn lazy_reference_to_a_removed_target_is_none() {
    let (factory, _store) = factory();
    let owner = persisted_owner(&factory);
    let target = owner.reference("secondLazyMappedEntity").unwrap().unwrap();
    factory.remove(&target).unwrap();

    let loaded = reload(&factory, &owner);
    assert_eq!(loaded.reference("secondLazyMappedEntity").unwrap(), None);
}

#[test]
fn unloaded_lazy_reference_is_kept_on_rewrite() {
    let (factory, _store) = factory();
    let owner = persisted_owner(&factory);
    let loaded = reload(&factory, &owner);
    loaded.set("name", "changed");
    factory.persist(&loaded).unwrap();

    let again = reload(&factory, &owner);
    let target = again.reference("secondLazyMappedEntity").unwrap().unwrap();
    assert_eq!(target.get_str("name").unwrap().as_deref(), Some("lazy"));
}

// ── Lazy collections ─────────────────────────────────────────────

#[test]
fn lazy_collection_loads_in_list_order_with_one_query() {
    let (factory, store) = recording_factory();
    let loaded = reload(&factory, &persisted_owner(&factory));
    assert!(matches!(loaded.raw("listProperty"), RawProperty::Unloaded));

    store.clear();
    let items = loaded.collection("listProperty").unwrap();
    let names: Vec<_> = items
        .iter()
        .map(|e| e.get_str("name").unwrap().unwrap())
        .collect();
    assert_eq!(names, vec!["l1", "l2", "l3"]);
    assert_eq!(store.count("execute"), 1);

    let again = loaded.collection("listProperty").unwrap();
    assert!(std::sync::Arc::ptr_eq(&items, &again));
    assert_eq!(store.count("execute"), 1);
}

#[test]
fn absent_lazy_collection_is_empty() {
    let (factory, _store) = factory();
    let entity = factory.new_instance("FirstEntity").unwrap();
    factory.persist(&entity).unwrap();

    let loaded = reload(&factory, &entity);
    assert!(matches!(loaded.raw("listProperty"), RawProperty::Absent));
    assert!(loaded.collection("listProperty").unwrap().is_empty());
}

#[test]
fn lazy_collection_skips_removed_members() {
    let (factory, _store) = factory();
    let owner = persisted_owner(&factory);
    let middle = owner.collection("listProperty").unwrap()[1].clone();
    factory.remove(&middle).unwrap();

    let items = reload(&factory, &owner).collection("listProperty").unwrap();
    let names: Vec<_> = items
        .iter()
        .map(|e| e.get_str("name").unwrap().unwrap())
        .collect();
    assert_eq!(names, vec!["l1", "l3"]);
}

#[test]
fn loaded_lazy_collection_is_rewritten_with_its_owner() {
    let (factory, _store) = factory();
    let owner = persisted_owner(&factory);
    let loaded = reload(&factory, &owner);

    let mut items = (*loaded.collection("listProperty").unwrap()).clone();
    items.reverse();
    loaded.set_collection("listProperty", items);
    factory.persist(&loaded).unwrap();

    let names: Vec<_> = reload(&factory, &owner)
        .collection("listProperty")
        .unwrap()
        .iter()
        .map(|e| e.get_str("name").unwrap().unwrap())
        .collect();
    assert_eq!(names, vec!["l3", "l2", "l1"]);
}
