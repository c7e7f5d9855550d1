use firebrand_types::EntityId;
use std::collections::HashSet;
use std::str::FromStr;

// ── EntityId ──────────────────────────────────────────────────────

#[test]
fn entity_id_new_is_unique() {
    let a = EntityId::new();
    let b = EntityId::new();
    assert_ne!(a, b);
}

#[test]
fn entity_id_from_uuid_roundtrip() {
    let uuid = uuid::Uuid::now_v7();
    let id = EntityId::from_uuid(uuid);
    assert_eq!(id.as_uuid(), uuid);
}

#[test]
fn entity_id_display_and_parse() {
    let id = EntityId::new();
    let s = id.to_string();
    let parsed = EntityId::parse(&s).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn entity_id_key_matches_display() {
    let id = EntityId::new();
    assert_eq!(id.to_key(), id.to_string());
    assert_eq!(id.to_key().len(), 36);
}

#[test]
fn entity_id_from_str() {
    let id = EntityId::new();
    let parsed: EntityId = EntityId::from_str(&id.to_string()).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn entity_id_parse_invalid() {
    assert!(EntityId::parse("not-a-uuid").is_err());
}

#[test]
fn entity_id_hash_and_eq() {
    let id = EntityId::new();
    let mut set = HashSet::new();
    set.insert(id);
    set.insert(id);
    assert_eq!(set.len(), 1);
}

// ── Key ordering ──────────────────────────────────────────────────

#[test]
fn keys_sort_in_creation_order() {
    let ids: Vec<EntityId> = (0..200).map(|_| EntityId::new()).collect();
    let keys: Vec<String> = ids.iter().map(EntityId::to_key).collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[test]
fn cbor_form_is_the_plain_uuid() {
    let id = EntityId::new();
    let bytes = serde_cbor::to_vec(&id).unwrap();
    let back: EntityId = serde_cbor::from_slice(&bytes).unwrap();
    assert_eq!(back, id);
}
