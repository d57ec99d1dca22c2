//! Core types for logbridge-core.
//!
//! This module defines the backend-facing data model: the normalised [`Value`]
//! union, the [`KeyValue`] attribute pair, the [`Severity`] scale and the
//! [`Record`] handed to a backend logger.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A normalised log value. Exactly one variant is active; values are never
/// mutated after construction.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// No value (nil pointers, `None`, `()`, the synthetic value of a
    /// dangling key).
    #[default]
    Empty,
    Bool(bool),
    String(String),
    Int64(i64),
    Float64(f64),
    Bytes(Vec<u8>),
    Slice(Vec<Value>),
    /// Ordered key/value entries. Keys may repeat.
    Map(Vec<KeyValue>),
}

impl Value {
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Value::Slice(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[KeyValue]> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Short lowercase name of the active variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Empty => "empty",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Int64(_) => "int64",
            Value::Float64(_) => "float64",
            Value::Bytes(_) => "bytes",
            Value::Slice(_) => "slice",
            Value::Map(_) => "map",
        }
    }
}

/// Plain textual rendering. Strings are written without quotes, which is what
/// key coercion and the tracing backend rely on.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Int64(n) => write!(f, "{n}"),
            Value::Float64(n) => write!(f, "{n}"),
            Value::Bytes(bytes) => {
                write!(f, "0x")?;
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            Value::Slice(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, kv) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", kv.key, kv.value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Empty => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::String(s) => serializer.serialize_str(s),
            Value::Int64(n) => serializer.serialize_i64(*n),
            Value::Float64(n) => serializer.serialize_f64(*n),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::Slice(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => AttributeMap(entries).serialize(serializer),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int64(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int64(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float64(n)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Slice(items)
    }
}

impl From<Vec<KeyValue>> for Value {
    fn from(entries: Vec<KeyValue>) -> Self {
        Value::Map(entries)
    }
}

// ---------------------------------------------------------------------------
// KeyValue
// ---------------------------------------------------------------------------

/// A single attribute: a string key and its normalised value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyValue {
    pub key: String,
    pub value: Value,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Serializes a list of attributes as a single object, keeping order and
/// duplicate keys.
#[derive(Debug, Clone, Copy)]
pub struct AttributeMap<'a>(pub &'a [KeyValue]);

impl Serialize for AttributeMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for kv in self.0 {
            map.serialize_entry(&kv.key, &kv.value)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// OpenTelemetry severity number. Larger is more severe.
///
/// The scale is open: verbosity offsets may push a number past
/// [`Severity::FATAL4`], and such numbers are kept rather than clamped.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Severity(u32);

impl Severity {
    pub const UNDEFINED: Severity = Severity(0);
    pub const TRACE: Severity = Severity(1);
    pub const TRACE2: Severity = Severity(2);
    pub const TRACE3: Severity = Severity(3);
    pub const TRACE4: Severity = Severity(4);
    pub const DEBUG: Severity = Severity(5);
    pub const DEBUG2: Severity = Severity(6);
    pub const DEBUG3: Severity = Severity(7);
    pub const DEBUG4: Severity = Severity(8);
    pub const INFO: Severity = Severity(9);
    pub const INFO2: Severity = Severity(10);
    pub const INFO3: Severity = Severity(11);
    pub const INFO4: Severity = Severity(12);
    pub const WARN: Severity = Severity(13);
    pub const WARN2: Severity = Severity(14);
    pub const WARN3: Severity = Severity(15);
    pub const WARN4: Severity = Severity(16);
    pub const ERROR: Severity = Severity(17);
    pub const ERROR2: Severity = Severity(18);
    pub const ERROR3: Severity = Severity(19);
    pub const ERROR4: Severity = Severity(20);
    pub const FATAL: Severity = Severity(21);
    pub const FATAL2: Severity = Severity(22);
    pub const FATAL3: Severity = Severity(23);
    pub const FATAL4: Severity = Severity(24);

    pub const fn new(number: u32) -> Self {
        Severity(number)
    }

    pub const fn number(self) -> u32 {
        self.0
    }

    /// This severity shifted `level` steps up the numeric scale.
    pub const fn offset(self, level: u32) -> Self {
        Severity(self.0.saturating_add(level))
    }

    /// Canonical short name (`INFO`, `INFO2`, …), or `None` outside 1..=24.
    pub fn name(self) -> Option<&'static str> {
        const NAMES: [&str; 24] = [
            "TRACE", "TRACE2", "TRACE3", "TRACE4", "DEBUG", "DEBUG2", "DEBUG3", "DEBUG4", "INFO",
            "INFO2", "INFO3", "INFO4", "WARN", "WARN2", "WARN3", "WARN4", "ERROR", "ERROR2",
            "ERROR3", "ERROR4", "FATAL", "FATAL2", "FATAL3", "FATAL4",
        ];
        let index = usize::try_from(self.0.checked_sub(1)?).ok()?;
        NAMES.get(index).copied()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "SEVERITY({})", self.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One log event in backend form. Built fresh per call and moved into the
/// backend; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    /// Time of the logging call. `None` only for enablement probes.
    pub timestamp: Option<DateTime<Utc>>,
    pub severity: Severity,
    /// Always a [`Value::String`] for records built by the sink.
    pub body: Value,
    pub attributes: Vec<KeyValue>,
}

impl Record {
    /// A probe record carrying only a severity, as passed to
    /// [`Logger::enabled`](crate::provider::Logger::enabled).
    pub fn probe(severity: Severity) -> Self {
        Self {
            severity,
            ..Self::default()
        }
    }

    pub fn add_attributes(&mut self, attrs: impl IntoIterator<Item = KeyValue>) {
        self.attributes.extend(attrs);
    }

    /// First attribute with the given key.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.iter().find(|kv| kv.key == key).map(|kv| &kv.value)
    }

    pub fn attribute_keys(&self) -> Vec<&str> {
        self.attributes.iter().map(|kv| kv.key.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// Complex
// ---------------------------------------------------------------------------

/// A complex number. Logged as a string of the form `(re+imi)`, with each
/// component printed at the precision of `T`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex<T> {
    pub re: T,
    pub im: T,
}

impl<T> Complex<T> {
    pub const fn new(re: T, im: T) -> Self {
        Self { re, im }
    }
}

/// `(re+imi)`. The imaginary part always carries a sign, `NaN` included;
/// infinities are written `+Inf` / `-Inf`.
macro_rules! complex_display {
    ($($t:ty),+ $(,)?) => {
        $(
            impl fmt::Display for Complex<$t> {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    let (re, im) = (self.re, self.im);
                    f.write_str("(")?;
                    if re.is_nan() {
                        f.write_str("NaN")?;
                    } else if re.is_infinite() {
                        f.write_str(if re > 0.0 { "+Inf" } else { "-Inf" })?;
                    } else {
                        write!(f, "{re}")?;
                    }
                    if im.is_nan() {
                        f.write_str("+NaN")?;
                    } else if im.is_infinite() {
                        f.write_str(if im > 0.0 { "+Inf" } else { "-Inf" })?;
                    } else {
                        write!(f, "{im:+}")?;
                    }
                    f.write_str("i)")
                }
            }
        )+
    };
}

complex_display!(f32, f64);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
