#![allow(unused)]
//! Sink integration harness.
//!
//! # What this covers
//!
//! - **Attribute order**: `logger`, `err`, accumulated values, call pairs.
//! - **Derivation**: hierarchical names, sibling isolation, parents untouched.
//! - **Severity mapping**: info levels, error calls, the `enabled` probe.
//! - **Concurrency**: many threads deriving from and logging through one sink.
//!
//! # Running
//!
//! ```sh
//! cargo test --test sink_harness
//! ```

mod common;
use common::*;

use std::sync::Arc;
use std::thread;

use logbridge::{LogSink, Loggable, Severity, Value};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[derive(Debug, thiserror::Error)]
#[error("connection refused")]
struct Refused;

#[derive(Debug, thiserror::Error)]
#[error("query failed")]
struct QueryFailed(#[source] Refused);

// ---------------------------------------------------------------------------
// Attribute order
// ---------------------------------------------------------------------------

#[test]
fn full_record_layout() {
    let h = SinkHarness::new();
    let sink = h
        .sink
        .derive_name("api")
        .derive_values(&[&"region", &"eu-1"]);

    sink.error(Some(&Refused), "dial failed", &[&"attempt", &3]);

    let record = h.single();
    assert_well_formed(&record);
    assert_eq!(record.severity, Severity::ERROR);
    assert_eq!(record.body, string("dial failed"));
    assert_attr_keys!(record, ["logger", "err", "region", "attempt"]);
    assert_attr!(record, "logger", string("api"));
    assert_attr!(record, "err", string("connection refused"));
    assert_attr!(record, "region", string("eu-1"));
    assert_attr!(record, "attempt", Value::Int64(3));
}

#[test]
fn unnamed_sink_has_no_logger_attribute() {
    let h = SinkHarness::new();
    h.sink.info(0, "plain", &[&"k", &"v"]);

    let record = h.single();
    assert_no_attr!(record, "logger");
    assert_attr_keys!(record, ["k"]);
}

#[test]
fn error_without_error_value_omits_err() {
    let h = SinkHarness::new();
    h.sink.error(None, "no cause", &[]);

    let record = h.single();
    assert_eq!(record.severity, Severity::ERROR);
    assert_no_attr!(record, "err");
    assert!(record.attributes.is_empty());
}

#[test]
fn error_chain_is_joined() {
    let h = SinkHarness::new();
    h.sink.error(Some(&QueryFailed(Refused)), "boom", &[]);

    let record = h.single();
    assert_attr!(record, "err", string("query failed: connection refused"));
}

#[test]
fn duplicate_keys_are_kept_in_order() {
    let h = SinkHarness::new();
    let sink = h.sink.derive_values(&[&"k", &1]);
    sink.info(0, "dup", &[&"k", &2, &"k", &3]);

    let record = h.single();
    assert_attr_keys!(record, ["k", "k", "k"]);
    let values: Vec<&Value> = record.attributes.iter().map(|kv| &kv.value).collect();
    assert_eq!(
        values,
        vec![&Value::Int64(1), &Value::Int64(2), &Value::Int64(3)]
    );
}

#[test]
fn dangling_call_key_is_empty() {
    let h = SinkHarness::new();
    h.sink.info(0, "dangling", &[&"a", &1, &"b"]);

    let record = h.single();
    assert_attr!(record, "b", Value::Empty);
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

#[test]
fn names_join_with_slash() {
    let h = SinkHarness::new();
    h.sink.derive_name("a").derive_name("b").info(0, "x", &[]);

    assert_attr!(h.single(), "logger", string("a/b"));
}

#[test]
fn boxed_derivation_matches_concrete() {
    let h = SinkHarness::new();
    let boxed: Box<dyn LogSink> = h.sink.with_name("svc");
    let boxed = boxed.with_values(&[&"id", &7_u16]);
    boxed.info(1, "via trait", &[]);

    let record = h.single();
    assert_eq!(record.severity, Severity::INFO2);
    assert_attr_keys!(record, ["logger", "id"]);
    assert_attr!(record, "id", Value::Int64(7));
}

#[test]
fn siblings_do_not_see_each_other() {
    let h = SinkHarness::new();
    let parent = h.sink.derive_values(&[&"shared", &true]);
    let left = parent.derive_values(&[&"side", &"left"]);
    let right = parent.derive_values(&[&"side", &"right"]);

    left.info(0, "l", &[]);
    right.info(0, "r", &[]);
    parent.info(0, "p", &[]);

    let records = h.records();
    assert_eq!(records.len(), 3);
    assert_attr_keys!(records[0], ["shared", "side"]);
    assert_attr!(records[0], "side", string("left"));
    assert_attr_keys!(records[1], ["shared", "side"]);
    assert_attr!(records[1], "side", string("right"));
    assert_attr_keys!(records[2], ["shared"]);
}

#[test]
fn deriving_leaves_parent_unchanged() {
    let h = SinkHarness::new();
    let parent = h.sink.derive_name("root").derive_values(&[&"a", &1]);
    let _child = parent.derive_name("child").derive_values(&[&"b", &2]);

    assert_eq!(parent.name(), "root");
    assert_eq!(parent.values(), &[kv("a", 1)]);
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

#[rstest]
#[case(0, Severity::INFO)]
#[case(1, Severity::INFO2)]
#[case(3, Severity::INFO4)]
#[case(4, Severity::WARN)]
#[case(8, Severity::ERROR)]
fn info_level_offsets_severity(#[case] level: u32, #[case] expected: Severity) {
    let h = SinkHarness::new();
    h.sink.info(level, "leveled", &[]);
    assert_eq!(h.single().severity, expected);
}

#[rstest]
#[case::debug_floor(Severity::DEBUG, 0, true)]
#[case::above_floor(Severity::DEBUG3, 1, false)]
#[case::reaches_floor(Severity::DEBUG3, 2, true)]
#[case::info_floor_rejects_default(Severity::INFO, 0, false)]
#[case::info_floor_accepts_four(Severity::INFO, 4, true)]
fn enabled_probes_at_debug_offset(
    #[case] min: Severity,
    #[case] level: u32,
    #[case] expected: bool,
) {
    let h = SinkHarness::with_min_severity(min);
    assert_eq!(h.sink.enabled(level), expected);
    assert!(h.records().is_empty(), "enabled must not emit");
}

#[test]
fn disabled_records_are_dropped_by_backend() {
    let h = SinkHarness::with_min_severity(Severity::WARN);
    h.sink.info(0, "too quiet", &[]);
    h.sink.error(None, "loud", &[]);

    let records = h.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].body, string("loud"));
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn concurrent_derivation_is_isolated() {
    let h = SinkHarness::new();
    let base = Arc::new(h.sink.derive_name("pool").derive_values(&[&"pool", &"main"]));

    let handles: Vec<_> = (0..8_u32)
        .map(|worker| {
            let base = Arc::clone(&base);
            thread::spawn(move || {
                let sink = base
                    .derive_name(&format!("w{worker}"))
                    .derive_values(&[&"worker", &worker]);
                for i in 0..25_u32 {
                    sink.info(0, "tick", &[&"i", &i]);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let records = h.records();
    assert_eq!(records.len(), 8 * 25);
    for record in &records {
        assert_attr_keys!(record, ["logger", "pool", "worker", "i"]);
        let worker = record.attribute("worker").and_then(Value::as_i64).unwrap();
        assert_attr!(record, "logger", Value::String(format!("pool/w{worker}")));
    }
    assert_eq!(base.values(), &[kv("pool", "main")]);
}
