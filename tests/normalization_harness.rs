#![allow(unused)]
//! Normalizer integration harness.
//!
//! # What this covers
//!
//! - **Scalars**: every integer and float width keeps its exact value within
//!   64 bits; unsigned values above `i64::MAX` become exact decimal strings.
//! - **Time**: durations become nanosecond counts, timestamps become Unix
//!   nanoseconds.
//! - **Containers**: heterogeneous lists keep element order; `None` and empty
//!   boxes become `Empty`; fixed arrays, nested vectors, options of vectors
//!   and maps of vectors are walked recursively.
//! - **Pairs**: odd-length lists, non-string keys, duplicates, and the pair
//!   count for any list length.
//! - **Fallbacks**: struct dumps and the `unhandled:` marker.
//!
//! # What this does NOT cover
//!
//! - `HashMap` entry order, which follows hash iteration and is not stable
//!
//! # Running
//!
//! ```sh
//! cargo test --test normalization_harness
//! ```

mod common;
use common::*;

use std::collections::BTreeMap;
use std::time::{Duration, UNIX_EPOCH};

use logbridge::{list, normalize, normalize_pairs, valuer, Loggable, Valuer, Value};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

#[rstest]
#[case::i8(&i8::MIN, Value::Int64(-128))]
#[case::i16(&i16::MAX, Value::Int64(32_767))]
#[case::i32(&i32::MIN, Value::Int64(-2_147_483_648))]
#[case::i64(&i64::MAX, Value::Int64(i64::MAX))]
#[case::u8(&u8::MAX, Value::Int64(255))]
#[case::u16(&u16::MAX, Value::Int64(65_535))]
#[case::u32(&u32::MAX, Value::Int64(4_294_967_295))]
#[case::f32(&1.25_f32, Value::Float64(1.25))]
#[case::f64(&f64::MAX, Value::Float64(f64::MAX))]
#[case::bool(&false, Value::Bool(false))]
#[case::string(&"verbatim text", string("verbatim text"))]
fn scalar_widths_are_exact(#[case] input: &dyn Loggable, #[case] expected: Value) {
    assert_eq!(normalize(input), expected);
}

/// 2^63 does not fit an i64 and must not wrap to a negative number.
#[test]
fn two_to_the_sixty_three_is_decimal_text() {
    assert_eq!(
        normalize(&9_223_372_036_854_775_808_u64),
        string("9223372036854775808")
    );
    assert_eq!(
        normalize(&(i64::MAX as usize)),
        Value::Int64(i64::MAX)
    );
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

#[test]
fn fifteen_hundred_millis_is_nanoseconds() {
    assert_eq!(
        normalize(&Duration::from_millis(1500)),
        Value::Int64(1_500_000_000)
    );
}

#[test]
fn timestamps_count_from_the_unix_epoch() {
    assert_eq!(normalize(&UNIX_EPOCH), Value::Int64(0));
    let t = chrono::DateTime::<chrono::Utc>::from_timestamp(1_705_312_800, 0).unwrap();
    assert_eq!(normalize(&t), Value::Int64(1_705_312_800_000_000_000));
}

// ---------------------------------------------------------------------------
// Containers
// ---------------------------------------------------------------------------

#[test]
fn mixed_list_keeps_order_and_kinds() {
    let items = list![1, "two", 3.0];
    assert_eq!(
        normalize(&items),
        Value::Slice(vec![Value::Int64(1), string("two"), Value::Float64(3.0)])
    );
}

#[test]
fn nested_values_recurse() {
    let inner = list![true, list!["deep"]];
    let outer = list![inner, ()];
    assert_eq!(
        normalize(&outer),
        Value::Slice(vec![
            Value::Slice(vec![Value::Bool(true), Value::Slice(vec![string("deep")])]),
            Value::Empty,
        ])
    );
}

#[test]
fn null_references_are_empty() {
    let nothing: Option<Box<dyn Loggable>> = None;
    assert_eq!(normalize(&nothing), Value::Empty);
    assert_eq!(normalize(&None::<String>), Value::Empty);
}

#[test]
fn btree_map_keys_are_text() {
    let mut m: BTreeMap<&'static str, Box<dyn Loggable>> = BTreeMap::new();
    m.insert("id", Box::new(7_u8));
    m.insert("name", Box::new("node-1"));
    assert_eq!(
        normalize(&m),
        Value::Map(vec![kv("id", 7), kv("name", "node-1")])
    );
}

#[test]
fn json_documents_are_structural() {
    let doc = serde_json::json!(["a", 1, null, {"k": false}]);
    assert_eq!(
        normalize(&doc),
        Value::Slice(vec![
            string("a"),
            Value::Int64(1),
            Value::Empty,
            Value::Map(vec![kv("k", false)]),
        ])
    );
}

#[test]
fn bytes_stay_bytes() {
    let payload = bytes::Bytes::from_static(b"\x00\xff");
    assert_eq!(normalize(&payload), Value::Bytes(vec![0x00, 0xff]));
}

// ---------------------------------------------------------------------------
// Custom and fallback
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct RequestId(u64);

impl Valuer for RequestId {
    fn log_value(&self) -> Value {
        Value::String(format!("req-{:06}", self.0))
    }
}

#[derive(Debug)]
struct Endpoint {
    host: &'static str,
    port: u16,
}

#[derive(Debug)]
enum Phase {
    Warmup,
}

#[test]
fn valuer_supplies_its_own_form() {
    assert_eq!(normalize(&valuer(RequestId(42))), string("req-000042"));
}

#[test]
fn structs_are_dumped_field_by_field() {
    let ep = Endpoint { host: "db", port: 5432 };
    assert_eq!(
        normalize(&ep),
        string(r#"Endpoint { host: "db", port: 5432 }"#)
    );
}

#[test]
fn unknown_values_are_marked_unhandled() {
    let Value::String(text) = normalize(&Phase::Warmup) else {
        panic!("expected string fallback");
    };
    assert!(text.starts_with("unhandled: ("), "{text}");
    assert!(text.ends_with("Phase) Warmup"), "{text}");
}

// ---------------------------------------------------------------------------
// Pairs
// ---------------------------------------------------------------------------

#[test]
fn odd_length_pairs_keep_trailing_key() {
    assert_eq!(
        normalize_pairs(&[&"a", &1, &"b"]),
        vec![kv("a", 1), kv("b", Value::Empty)]
    );
}

#[test]
fn non_string_key_is_rendered() {
    assert_eq!(normalize_pairs(&[&42, &"x"]), vec![kv("42", "x")]);
    assert_eq!(normalize_pairs(&[&true, &1]), vec![kv("true", 1)]);
}

#[test]
fn empty_pairs_are_empty() {
    assert_eq!(normalize_pairs(&[]), Vec::new());
}

#[test]
fn call_site_literals_are_lists() {
    let pairs = normalize_pairs(&[&"ids", &[1, 2, 3], &"matrix", &vec![vec![0.5], vec![]]]);
    assert_eq!(
        pairs,
        vec![
            kv("ids", vec![Value::Int64(1), Value::Int64(2), Value::Int64(3)]),
            kv(
                "matrix",
                vec![Value::Slice(vec![Value::Float64(0.5)]), Value::Slice(vec![])]
            ),
        ]
    );
}

#[test]
fn option_and_map_of_lists() {
    assert_eq!(
        normalize(&Some(vec!["a", "b"])),
        Value::Slice(vec![string("a"), string("b")])
    );

    let mut groups: BTreeMap<String, Vec<u32>> = BTreeMap::new();
    groups.insert("odd".into(), vec![1, 3]);
    groups.insert("even".into(), vec![]);
    assert_eq!(
        normalize(&groups),
        Value::Map(vec![
            kv("even", Value::Slice(vec![])),
            kv("odd", vec![Value::Int64(1), Value::Int64(3)]),
        ])
    );
}

proptest! {
    /// Any list of `n` items yields `ceil(n / 2)` pairs, keys in order.
    #[test]
    fn pair_count_is_half_rounded_up(keys in prop::collection::vec("[a-z]{1,8}", 0..40)) {
        let items: Vec<&dyn Loggable> = keys.iter().map(|k| k as &dyn Loggable).collect();
        let pairs = normalize_pairs(&items);
        prop_assert_eq!(pairs.len(), keys.len().div_ceil(2));
        for (pair, key) in pairs.iter().zip(keys.iter().step_by(2)) {
            prop_assert_eq!(&pair.key, key);
        }
        if keys.len() % 2 == 1 {
            prop_assert_eq!(&pairs[pairs.len() - 1].value, &Value::Empty);
        }
    }
}
