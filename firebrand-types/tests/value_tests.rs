use firebrand_types::{payload, ColumnEnum, ColumnValue, EntityId, Row, Timestamp, Value};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::cmp::Ordering;

#[derive(Debug, PartialEq)]
enum Shade {
    Light,
    Dark,
}

impl ColumnEnum for Shade {
    fn variants() -> &'static [&'static str] {
        &["Light", "Dark"]
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Light => "Light",
            Self::Dark => "Dark",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "Light" => Some(Self::Light),
            "Dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

// ── Value conversions ────────────────────────────────────────────

#[test]
fn conversions_pick_the_matching_variant() {
    assert_eq!(Value::from(true), Value::Boolean(true));
    assert_eq!(Value::from(7i32), Value::Int(7));
    assert_eq!(Value::from(7i64), Value::Long(7));
    assert_eq!(Value::from(1.5), Value::Double(1.5));
    assert_eq!(Value::from("a"), Value::Text("a".into()));
    assert_eq!(Value::from(vec![1u8, 2]), Value::Bytes(vec![1, 2]));
    assert_eq!(Value::from(None::<i64>), Value::Null);
}

#[test]
fn entity_id_converts_to_its_key() {
    let id = EntityId::new();
    assert_eq!(Value::from(id).as_str(), Some(id.to_key().as_str()));
}

#[test]
fn numeric_accessors_widen() {
    assert_eq!(Value::Int(3).as_i64(), Some(3));
    assert_eq!(Value::Long(3).as_f64(), Some(3.0));
    assert_eq!(Value::Double(3.5).as_i64(), None);
    assert_eq!(Value::Text("3".into()).as_f64(), None);
}

#[test]
fn enum_values_travel_by_name() {
    let value = Value::from_enum(&Shade::Dark);
    assert_eq!(value, Value::Text("Dark".into()));
    assert_eq!(value.as_enum::<Shade>(), Some(Shade::Dark));
    assert_eq!(Value::Text("Dim".into()).as_enum::<Shade>(), None);
    assert_eq!(Shade::variants().len(), 2);
}

#[test]
fn timestamp_accessor() {
    let ts = Timestamp::from_millis(42);
    assert_eq!(Value::from(ts).as_timestamp(), Some(ts));
    assert!(Value::Null.is_null());
}

// ── Column comparison ────────────────────────────────────────────

#[test]
fn text_compares_lexicographically() {
    let a = ColumnValue::Text("a".into());
    let b = ColumnValue::Text("b".into());
    assert_eq!(a.compare(&b), Some(Ordering::Less));
}

#[test]
fn numbers_compare_across_kinds() {
    assert_eq!(
        ColumnValue::Long(2).compare(&ColumnValue::Double(1.5)),
        Some(Ordering::Greater)
    );
    assert_eq!(
        ColumnValue::Timestamp(1000).compare(&ColumnValue::Long(1000)),
        Some(Ordering::Equal)
    );
    assert_eq!(
        ColumnValue::Int(1).compare(&ColumnValue::Counter(2)),
        Some(Ordering::Less)
    );
}

#[test]
fn unrelated_kinds_do_not_compare() {
    assert_eq!(ColumnValue::Text("1".into()).compare(&ColumnValue::Long(1)), None);
    assert_eq!(ColumnValue::Boolean(true).compare(&ColumnValue::Int(1)), None);
}

#[test]
fn large_longs_compare_exactly() {
    let a = ColumnValue::Long(i64::MAX);
    let b = ColumnValue::Long(i64::MAX - 1);
    assert_eq!(a.compare(&b), Some(Ordering::Greater));
}

proptest! {
    #[test]
    fn long_comparison_matches_integer_order(a in any::<i64>(), b in any::<i64>()) {
        prop_assert_eq!(ColumnValue::Long(a).compare(&ColumnValue::Long(b)), Some(a.cmp(&b)));
    }

    #[test]
    fn text_comparison_matches_string_order(a in ".{0,12}", b in ".{0,12}") {
        let ord = ColumnValue::Text(a.clone()).compare(&ColumnValue::Text(b.clone()));
        prop_assert_eq!(ord, Some(a.cmp(&b)));
    }

    #[test]
    fn payload_decode_is_symmetric(items in proptest::collection::vec(any::<i64>(), 0..16), text in ".{0,16}") {
        let mut list: Vec<Value> = items.into_iter().map(Value::Long).collect();
        list.push(Value::Text(text));
        let value = Value::List(list);
        prop_assert_eq!(payload::decode(&payload::encode(&value).unwrap()).unwrap(), value);
    }
}

// ── Rows ─────────────────────────────────────────────────────────

#[test]
fn row_prefix_lookup() {
    let row = Row::new("k")
        .with("other.first", ColumnValue::Text("x".into()))
        .with("plain", ColumnValue::Long(1));
    assert!(row.has_prefix("other."));
    assert!(!row.has_prefix("missing."));
    assert!(!row.is_empty());
    assert!(Row::new("k").is_empty());
}
