use firebrand_codec::{
    CodecError, decode, decode_collection, decode_reference, encode, encode_collection,
    encode_reference, flatten, literal, unflatten,
};
use firebrand_model::{
    AssociationDescriptor, ColumnDescriptor, EmbeddableDescriptor, Embedded, EntityDescriptor,
    Registry,
};
use firebrand_types::{ColumnValue, EntityId, Row, Timestamp, Value};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeMap;

fn roundtrip(value: Value, column: &ColumnDescriptor) -> Value {
    let encoded = encode(&value, column).unwrap();
    decode(encoded.as_ref(), column).unwrap()
}

// ── Scalars ──────────────────────────────────────────────────────

#[test]
fn null_writes_nothing_and_absent_reads_null() {
    let column = ColumnDescriptor::text("name");
    assert_eq!(encode(&Value::Null, &column).unwrap(), None);
    assert_eq!(decode(None, &column).unwrap(), Value::Null);
}

#[test]
fn widening_is_allowed() {
    assert_eq!(
        encode(&Value::Int(3), &ColumnDescriptor::long("l")).unwrap(),
        Some(ColumnValue::Long(3))
    );
    assert_eq!(
        encode(&Value::Long(3), &ColumnDescriptor::double("d")).unwrap(),
        Some(ColumnValue::Double(3.0))
    );
}

#[test]
fn type_mismatch_is_reported() {
    let err = encode(&Value::Text("x".into()), &ColumnDescriptor::long("phone")).unwrap_err();
    assert!(matches!(
        err,
        CodecError::TypeMismatch { expected: "long", found: "text", .. }
    ));
    let err = decode(Some(&ColumnValue::Text("x".into())), &ColumnDescriptor::boolean("b"))
        .unwrap_err();
    assert!(matches!(err, CodecError::TypeMismatch { .. }));
}

#[test]
fn enum_names_are_checked_both_ways() {
    let column = ColumnDescriptor::enumeration("testEnum", &["FIRST", "SECOND"]);
    assert_eq!(
        roundtrip(Value::Text("SECOND".into()), &column),
        Value::Text("SECOND".into())
    );
    assert!(matches!(
        encode(&Value::Text("THIRD".into()), &column),
        Err(CodecError::UnknownVariant { .. })
    ));
    assert!(matches!(
        decode(Some(&ColumnValue::Text("THIRD".into())), &column),
        Err(CodecError::UnknownVariant { .. })
    ));
}

#[test]
fn serialized_heterogeneous_list_keeps_kinds() {
    let column = ColumnDescriptor::serialized("listSerializedAsBytes");
    let value = Value::List(vec![
        Value::Text("1".into()),
        Value::Int(2),
        Value::Double(3.0),
        Value::Long(4),
    ]);
    let encoded = encode(&value, &column).unwrap();
    assert!(matches!(encoded, Some(ColumnValue::Bytes(_))));
    assert_eq!(decode(encoded.as_ref(), &column).unwrap(), value);
}

#[test]
fn counter_reads_total_as_long() {
    let column = ColumnDescriptor::counter("c", "d");
    assert_eq!(
        encode(&Value::Long(2), &column).unwrap(),
        Some(ColumnValue::Counter(2))
    );
    assert_eq!(
        decode(Some(&ColumnValue::Counter(12)), &column).unwrap(),
        Value::Long(12)
    );
}

#[test]
fn bytes_and_timestamps_roundtrip() {
    assert_eq!(
        roundtrip(Value::Bytes(vec![1, 2, 3]), &ColumnDescriptor::bytes("b")),
        Value::Bytes(vec![1, 2, 3])
    );
    let ts = Timestamp::from_millis(1_700_000_000_123);
    assert_eq!(
        roundtrip(Value::Timestamp(ts), &ColumnDescriptor::timestamp("t")),
        Value::Timestamp(ts)
    );
}

#[test]
fn literal_without_descriptor() {
    assert_eq!(literal(&Value::Null).unwrap(), None);
    assert_eq!(
        literal(&Value::Text("a".into())).unwrap(),
        Some(ColumnValue::Text("a".into()))
    );
    assert_eq!(
        literal(&Value::Timestamp(Timestamp::from_millis(9))).unwrap(),
        Some(ColumnValue::Timestamp(9))
    );
    assert!(matches!(
        literal(&Value::List(vec![Value::Int(1)])).unwrap(),
        Some(ColumnValue::Bytes(_))
    ));
}

proptest! {
    #[test]
    fn long_columns_roundtrip(v in any::<i64>()) {
        prop_assert_eq!(roundtrip(Value::Long(v), &ColumnDescriptor::long("l")), Value::Long(v));
    }

    #[test]
    fn text_columns_roundtrip(s in ".*") {
        prop_assert_eq!(
            roundtrip(Value::Text(s.clone()), &ColumnDescriptor::text("t")),
            Value::Text(s)
        );
    }

    #[test]
    fn finite_doubles_roundtrip(v in proptest::num::f64::NORMAL | proptest::num::f64::ZERO) {
        prop_assert_eq!(roundtrip(Value::Double(v), &ColumnDescriptor::double("d")), Value::Double(v));
    }

    #[test]
    fn int_range_is_enforced(v in any::<i64>()) {
        let result = encode(&Value::Long(v), &ColumnDescriptor::int("i"));
        prop_assert_eq!(result.is_ok(), i32::try_from(v).is_ok());
    }
}

// ── References & collections ─────────────────────────────────────

#[test]
fn reference_is_stored_as_key() {
    let id = EntityId::new();
    let raw = encode_reference(&id);
    assert_eq!(raw, ColumnValue::Text(id.to_key()));
    assert_eq!(decode_reference(Some(&raw), "r").unwrap(), Some(id));
    assert_eq!(decode_reference(None, "r").unwrap(), None);
}

#[test]
fn malformed_reference_is_rejected() {
    let raw = ColumnValue::Text("not-a-uuid".into());
    assert!(matches!(
        decode_reference(Some(&raw), "r"),
        Err(CodecError::InvalidReference { .. })
    ));
}

#[test]
fn collection_keeps_order() {
    let ids = vec![EntityId::new(), EntityId::new(), EntityId::new()];
    let reversed: Vec<_> = ids.iter().rev().copied().collect();
    let raw = encode_collection(&reversed).unwrap();
    assert_eq!(decode_collection(Some(&raw), "c").unwrap(), reversed);
    assert!(decode_collection(None, "c").unwrap().is_empty());
}

// ── Embedded values ──────────────────────────────────────────────

fn embedded_registry() -> Registry {
    Registry::builder()
        .entity(
            EntityDescriptor::new("Owner")
                .id("id")
                .association(AssociationDescriptor::embedded("other", "Other")),
        )
        .embeddable(
            EmbeddableDescriptor::new("Other")
                .column(ColumnDescriptor::text("first"))
                .column(ColumnDescriptor::text("nullProperty"))
                .embed("third", "Third"),
        )
        .embeddable(
            EmbeddableDescriptor::new("Third")
                .column(ColumnDescriptor::long("some").column_name("s"))
                .embed("fourth", "Fourth")
                .embed("fourthNull", "Fourth"),
        )
        .embeddable(EmbeddableDescriptor::new("Fourth").column(ColumnDescriptor::text("some")))
        .build()
        .unwrap()
}

fn nested_value() -> Embedded {
    Embedded::new("Other").with("first", "one").with_nested(
        "third",
        Embedded::new("Third")
            .with("some", 3_i64)
            .with_nested("fourth", Embedded::new("Fourth").with("some", "four")),
    )
}

#[test]
fn flatten_uses_namespaced_columns() {
    let registry = embedded_registry();
    let descriptor = registry.embeddable("Other").unwrap();
    let mut columns = BTreeMap::new();
    flatten("other", &nested_value(), descriptor, &registry, &mut columns).unwrap();

    let names: Vec<&str> = columns.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec!["other.first", "other.third.fourth.some", "other.third.s"]
    );
}

#[test]
fn nested_embedded_roundtrip() {
    let registry = embedded_registry();
    let descriptor = registry.embeddable("Other").unwrap();
    let mut row = Row::new("k");
    flatten("other", &nested_value(), descriptor, &registry, &mut row.columns).unwrap();

    let decoded = unflatten("other", &row, descriptor, &registry).unwrap().unwrap();
    assert_eq!(decoded, nested_value());
    assert_eq!(decoded.get("nullProperty"), &Value::Null);
    assert!(decoded.nested("third").unwrap().nested("fourthNull").is_none());
}

#[test]
fn absent_prefix_means_absent_value() {
    let registry = embedded_registry();
    let descriptor = registry.embeddable("Other").unwrap();
    let row = Row::new("k").with("otherwise", ColumnValue::Text("x".into()));
    assert_eq!(unflatten("other", &row, descriptor, &registry).unwrap(), None);
}

#[test]
fn undeclared_or_mistyped_embedded_is_rejected() {
    let registry = embedded_registry();
    let descriptor = registry.embeddable("Other").unwrap();
    let mut out = BTreeMap::new();

    let undeclared = Embedded::new("Other").with("bogus", 1_i64);
    assert!(matches!(
        flatten("other", &undeclared, descriptor, &registry, &mut out),
        Err(CodecError::UndeclaredProperty { .. })
    ));

    let mistyped = Embedded::new("Fourth");
    assert!(matches!(
        flatten("other", &mistyped, descriptor, &registry, &mut out),
        Err(CodecError::WrongEmbeddable { .. })
    ));
}
