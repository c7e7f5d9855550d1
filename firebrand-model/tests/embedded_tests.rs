use firebrand_model::Embedded;
use firebrand_types::Value;

fn make_address() -> Embedded {
    Embedded::new("Address")
        .with("street", "Main St")
        .with("number", 12_i64)
        .with_nested("geo", Embedded::new("Geo").with("lat", 1.5))
}

// ── Accessors ────────────────────────────────────────────────────

#[test]
fn scalar_access() {
    let e = make_address();
    assert_eq!(e.embeddable_type, "Address");
    assert_eq!(e.get_str("street"), Some("Main St"));
    assert_eq!(e.get("number").as_i64(), Some(12));
}

#[test]
fn missing_property_reads_null() {
    let e = make_address();
    assert_eq!(e.get("zip"), &Value::Null);
    assert_eq!(e.get_str("zip"), None);
}

#[test]
fn nested_access_and_mutation() {
    let mut e = make_address();
    assert_eq!(e.nested("geo").unwrap().get("lat").as_f64(), Some(1.5));
    e.nested_mut("geo").unwrap().set("lat", 2.0);
    assert_eq!(e.nested("geo").unwrap().get("lat").as_f64(), Some(2.0));

    e.set_nested("geo", None);
    assert!(e.nested("geo").is_none());
    assert!(e.nested("missing").is_none());
}

// ── Equality ─────────────────────────────────────────────────────

#[test]
fn equality_is_structural() {
    assert_eq!(make_address(), make_address());
    let mut other = make_address();
    other.set("street", "Side St");
    assert_ne!(make_address(), other);
}

#[test]
fn unset_and_null_are_equal() {
    let explicit = Embedded::new("Geo").with("lat", Value::Null);
    assert_eq!(explicit, Embedded::new("Geo"));

    let mut with_none = Embedded::new("Geo");
    with_none.set_nested("inner", None);
    assert_eq!(with_none, Embedded::new("Geo"));
    assert_ne!(Embedded::new("Geo"), Embedded::new("Address"));
}
