//! Domain-specific assertion macros for logbridge harnesses.
//!
//! These wrap `pretty_assertions` and add context-rich failure messages that
//! make it clear *which* record invariant was violated.

use logbridge::Record;

// ---------------------------------------------------------------------------
// Attribute assertions
// ---------------------------------------------------------------------------

/// Assert that a `Record` carries an attribute with the expected value
/// (first match by key).
///
/// ```rust
/// assert_attr!(record, "logger", Value::String("api".into()));
/// ```
#[macro_export]
macro_rules! assert_attr {
    ($record:expr, $key:expr, $value:expr) => {{
        let record: &logbridge::Record = &$record;
        let key: &str = $key;
        let expected: logbridge::Value = $value;
        match record.attribute(key) {
            Some(actual) => pretty_assertions::assert_eq!(
                actual, &expected,
                "attribute {:?} has the wrong value", key
            ),
            None => panic!(
                "assert_attr! failed: attribute {:?} not found.\n  Available: {:?}",
                key,
                record.attribute_keys()
            ),
        }
    }};
}

/// Assert that a `Record` has no attribute with the given key.
#[macro_export]
macro_rules! assert_no_attr {
    ($record:expr, $key:expr) => {{
        let record: &logbridge::Record = &$record;
        let key: &str = $key;
        if record.attribute(key).is_some() {
            panic!(
                "assert_no_attr! failed: attribute {:?} present.\n  Available: {:?}",
                key,
                record.attribute_keys()
            );
        }
    }};
}

/// Assert the exact attribute key sequence of a `Record`.
///
/// ```rust
/// assert_attr_keys!(record, ["logger", "err", "k"]);
/// ```
#[macro_export]
macro_rules! assert_attr_keys {
    ($record:expr, [$($key:expr),* $(,)?]) => {{
        let record: &logbridge::Record = &$record;
        let expected: Vec<&str> = vec![$($key),*];
        pretty_assertions::assert_eq!(
            record.attribute_keys(),
            expected,
            "attribute order mismatch"
        );
    }};
}

// ---------------------------------------------------------------------------
// Record invariants
// ---------------------------------------------------------------------------

/// Every record built by a sink has a timestamp and a string body.
pub fn assert_well_formed(record: &Record) {
    assert!(
        record.timestamp.is_some(),
        "record must carry a timestamp: {record:?}"
    );
    assert!(
        record.body.as_str().is_some(),
        "record body must be a string: {:?}",
        record.body
    );
}
