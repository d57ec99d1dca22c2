//! Normalizer — converts arbitrary caller values into [`Value`]s.
//!
//! Conversion is a prioritised chain of type matches: caller-provided
//! normalisations first, then scalars, time values, bytes and errors, then
//! containers, and finally a textual fallback. It never fails; values it does
//! not recognise come out as `"unhandled: (<type>) <debug dump>"`.
//!
//! Any `'static + Debug` type can be logged through [`Loggable`]. Types that
//! want a specific representation implement [`Valuer`] and are passed boxed
//! (see [`valuer`]).

use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::error::Error;
use std::fmt::{self, Write as _};
use std::rc::Rc;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, FixedOffset, Local, TimeDelta, TimeZone, Utc};

use crate::types::{Complex, KeyValue, Value};

/// Containers nested deeper than this render through the fallback instead of
/// being walked.
pub const MAX_DEPTH: usize = 32;

/// Key text used for empty keys.
pub const NIL_KEY: &str = "<nil>";

// ---------------------------------------------------------------------------
// Input traits
// ---------------------------------------------------------------------------

/// A value that can be handed to the sink. Implemented for every
/// `'static + Debug` type.
///
/// Errors get the `outer: cause: root` rendering only when passed as
/// `Box<dyn Error + Send + Sync>` (see [`error_value`]), `anyhow::Error`, or
/// one of the common std error types. Any other error type is logged like
/// any other value.
pub trait Loggable: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn type_name(&self) -> &'static str;
}

impl<T: Any + fmt::Debug> Loggable for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Custom normalisation for caller types. Takes precedence over every
/// built-in rule when passed as `Box<dyn Valuer>` or `Arc<dyn Valuer>`.
pub trait Valuer: fmt::Debug + Send + Sync {
    fn log_value(&self) -> Value;
}

/// Box a [`Valuer`] so the normalizer picks up its representation.
pub fn valuer<V: Valuer + 'static>(v: V) -> Box<dyn Valuer> {
    Box::new(v)
}

/// Box an error so its full cause chain is logged.
///
/// ```
/// # use logbridge_core::normalizer::{error_value, normalize};
/// # use logbridge_core::Value;
/// let err = error_value(std::io::Error::other("disk full"));
/// assert_eq!(normalize(&err), Value::String("disk full".into()));
/// ```
pub fn error_value<E: Error + Send + Sync + 'static>(err: E) -> Box<dyn Error + Send + Sync> {
    Box::new(err)
}

/// Build a heterogeneous `Vec<Box<dyn Loggable>>`, the loggable equivalent
/// of a mixed-type list.
///
/// ```
/// let items = logbridge_core::list![1, "two", 3.0];
/// assert_eq!(items.len(), 3);
/// ```
#[macro_export]
macro_rules! list {
    ($($item:expr),* $(,)?) => {
        ::std::vec![
            $(::std::boxed::Box::new($item) as ::std::boxed::Box<dyn $crate::normalizer::Loggable>),*
        ]
    };
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Normalise a single value.
pub fn normalize(value: &dyn Loggable) -> Value {
    normalize_at(value, 0)
}

/// Pair up an interleaved `key, value, key, value, …` list.
///
/// A trailing key without a value is paired with [`Value::Empty`]. Keys that
/// are not strings are rendered textually. Order and duplicates are kept.
pub fn normalize_pairs(items: &[&dyn Loggable]) -> Vec<KeyValue> {
    let mut out = Vec::with_capacity(items.len().div_ceil(2));
    for pair in items.chunks(2) {
        match pair {
            [key, value] => out.push(KeyValue::new(key_text(*key), normalize(*value))),
            [key] => out.push(KeyValue::new(key_text(*key), Value::Empty)),
            _ => {}
        }
    }
    out
}

/// Textual rendering of an attribute key.
///
/// Strings pass through. Empty keys (`()`, `None`) become `<nil>`; anything
/// else uses the `Display` form of its normalized value, so byte keys come
/// out as `0x..` hex.
pub fn key_text(key: &dyn Loggable) -> String {
    let any = key.as_any();
    if let Some(s) = any.downcast_ref::<String>() {
        return s.clone();
    }
    if let Some(s) = any.downcast_ref::<&'static str>() {
        return (*s).to_string();
    }
    match normalize(key) {
        Value::Empty => NIL_KEY.to_string(),
        value => value.to_string(),
    }
}

/// `outer: cause: root` rendering of an error and its source chain.
pub fn error_chain(err: &(dyn Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(text, ": {cause}");
        source = cause.source();
    }
    text
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

macro_rules! downcast_to {
    ($any:expr, $( $ty:ty => |$v:ident| $body:expr ),+ $(,)?) => {
        $(
            if let Some($v) = $any.downcast_ref::<$ty>() {
                return Some($body);
            }
        )+
    };
}

fn normalize_at(value: &dyn Loggable, depth: usize) -> Value {
    let any = value.as_any();

    if let Some(v) = scalar(any) {
        return v;
    }
    if let Some(v) = temporal(any) {
        return v;
    }
    if let Some(v) = bytes(any) {
        return v;
    }
    if let Some(text) = error_text(any) {
        return Value::String(text);
    }
    if depth >= MAX_DEPTH {
        return unhandled(value);
    }
    if let Some(json) = any.downcast_ref::<serde_json::Value>() {
        return from_json(json, depth);
    }
    if let Some(v) = indirect(any, depth) {
        return v;
    }
    if let Some(v) = container(any, depth) {
        return v;
    }
    if any.is::<()>() {
        return Value::Empty;
    }
    fallback(value)
}

fn scalar(any: &dyn Any) -> Option<Value> {
    downcast_to!(any,
        Value => |v| v.clone(),
        Box<dyn Valuer> => |v| v.log_value(),
        Arc<dyn Valuer> => |v| v.log_value(),
        bool => |v| Value::Bool(*v),
        String => |v| Value::String(v.clone()),
        &'static str => |v| Value::String((*v).to_string()),
        Cow<'static, str> => |v| Value::String(v.to_string()),
        Box<str> => |v| Value::String(v.to_string()),
        Arc<str> => |v| Value::String(v.to_string()),
        char => |v| Value::String(v.to_string()),
        i64 => |v| Value::Int64(*v),
        i32 => |v| Value::Int64(i64::from(*v)),
        i16 => |v| Value::Int64(i64::from(*v)),
        i8 => |v| Value::Int64(i64::from(*v)),
        isize => |v| signed(*v as i128),
        i128 => |v| signed(*v),
        u8 => |v| Value::Int64(i64::from(*v)),
        u16 => |v| Value::Int64(i64::from(*v)),
        u32 => |v| Value::Int64(i64::from(*v)),
        u64 => |v| unsigned(u128::from(*v)),
        usize => |v| unsigned(*v as u128),
        u128 => |v| unsigned(*v),
        f64 => |v| Value::Float64(*v),
        f32 => |v| Value::Float64(f64::from(*v)),
    );
    None
}

fn temporal(any: &dyn Any) -> Option<Value> {
    downcast_to!(any,
        Duration => |v| unsigned(v.as_nanos()),
        TimeDelta => |v| v
            .num_nanoseconds()
            .map_or_else(|| Value::String(v.to_string()), Value::Int64),
        SystemTime => |v| system_time(*v),
        DateTime<Utc> => |v| date_time(v),
        DateTime<FixedOffset> => |v| date_time(v),
        DateTime<Local> => |v| date_time(v),
        Complex<f64> => |v| Value::String(v.to_string()),
        Complex<f32> => |v| Value::String(v.to_string()),
    );
    None
}

fn bytes(any: &dyn Any) -> Option<Value> {
    downcast_to!(any,
        Vec<u8> => |v| Value::Bytes(v.clone()),
        &'static [u8] => |v| Value::Bytes(v.to_vec()),
        Box<[u8]> => |v| Value::Bytes(v.to_vec()),
        Arc<[u8]> => |v| Value::Bytes(v.to_vec()),
        bytes::Bytes => |v| Value::Bytes(v.to_vec()),
    );
    None
}

fn error_text(any: &dyn Any) -> Option<String> {
    downcast_to!(any,
        Box<dyn Error + Send + Sync> => |e| error_chain(&**e),
        Box<dyn Error> => |e| error_chain(&**e),
        Arc<dyn Error + Send + Sync> => |e| error_chain(&**e),
        anyhow::Error => |e| format!("{e:#}"),
        std::io::Error => |e| error_chain(e),
        serde_json::Error => |e| error_chain(e),
        fmt::Error => |e| error_chain(e),
        std::num::ParseIntError => |e| error_chain(e),
        std::num::ParseFloatError => |e| error_chain(e),
        std::num::TryFromIntError => |e| error_chain(e),
        std::str::ParseBoolError => |e| error_chain(e),
        std::str::Utf8Error => |e| error_chain(e),
        std::string::FromUtf8Error => |e| error_chain(e),
        crate::config::ConfigError => |e| error_chain(e),
        crate::provider::ProviderError => |e| error_chain(e),
    );
    None
}

fn indirect(any: &dyn Any, depth: usize) -> Option<Value> {
    downcast_to!(any,
        Box<dyn Loggable> => |v| normalize_at(&**v, depth + 1),
        Arc<dyn Loggable> => |v| normalize_at(&**v, depth + 1),
        Arc<dyn Loggable + Send + Sync> => |v| normalize_at(&**v, depth + 1),
        Rc<dyn Loggable> => |v| normalize_at(&**v, depth + 1),
    );
    None
}

// ---------------------------------------------------------------------------
// Containers
// ---------------------------------------------------------------------------

/// Ordered collections, walked element by element.
trait Sequence: Any {
    fn items(&self) -> impl Iterator<Item = &dyn Loggable> + '_;
}

macro_rules! sequences {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl<T: Loggable> Sequence for $ty {
                fn items(&self) -> impl Iterator<Item = &dyn Loggable> + '_ {
                    self.iter().map(|item| item as &dyn Loggable)
                }
            }
        )+
    };
}

sequences!(Vec<T>, VecDeque<T>, &'static [T], Box<[T]>);

impl<T: Loggable, const N: usize> Sequence for [T; N] {
    fn items(&self) -> impl Iterator<Item = &dyn Loggable> + '_ {
        self.iter().map(|item| item as &dyn Loggable)
    }
}

trait MapKey: Any {
    fn as_key(&self) -> &str;
}

impl MapKey for String {
    fn as_key(&self) -> &str {
        self
    }
}

impl MapKey for &'static str {
    fn as_key(&self) -> &str {
        self
    }
}

/// Keyed collections with textual keys.
trait Mapping: Any {
    fn entries(&self) -> impl Iterator<Item = (&str, &dyn Loggable)> + '_;
}

impl<K: MapKey, V: Loggable> Mapping for HashMap<K, V> {
    fn entries(&self) -> impl Iterator<Item = (&str, &dyn Loggable)> + '_ {
        self.iter().map(|(k, v)| (k.as_key(), v as &dyn Loggable))
    }
}

impl<K: MapKey, V: Loggable> Mapping for BTreeMap<K, V> {
    fn entries(&self) -> impl Iterator<Item = (&str, &dyn Loggable)> + '_ {
        self.iter().map(|(k, v)| (k.as_key(), v as &dyn Loggable))
    }
}

/// Values that hold at most one other value.
trait Indirect: Any {
    fn target(&self) -> Option<&dyn Loggable>;
}

impl<T: Loggable> Indirect for Option<T> {
    fn target(&self) -> Option<&dyn Loggable> {
        self.as_ref().map(|v| v as &dyn Loggable)
    }
}

impl<T: Loggable> Indirect for Box<T> {
    fn target(&self) -> Option<&dyn Loggable> {
        Some(&**self as &dyn Loggable)
    }
}

impl<T: Loggable> Indirect for Arc<T> {
    fn target(&self) -> Option<&dyn Loggable> {
        Some(&**self as &dyn Loggable)
    }
}

type Walker = fn(&dyn Any, usize) -> Option<Value>;

fn walk_sequence<S: Sequence>(any: &dyn Any, depth: usize) -> Option<Value> {
    any.downcast_ref::<S>().map(|s| slice_of(s.items(), depth))
}

fn walk_mapping<M: Mapping>(any: &dyn Any, depth: usize) -> Option<Value> {
    any.downcast_ref::<M>().map(|m| map_of(m.entries(), depth))
}

fn walk_indirect<I: Indirect>(any: &dyn Any, depth: usize) -> Option<Value> {
    any.downcast_ref::<I>().map(|v| {
        v.target()
            .map_or(Value::Empty, |inner| normalize_at(inner, depth + 1))
    })
}

macro_rules! array_lengths {
    ($shapes:expr, $elem:ty; $($n:literal)+) => {{
        $( $shapes.sequence::<[$elem; $n]>(); )+
        $shapes
    }};
}

/// Container types the normalizer can walk, keyed by `TypeId`.
#[derive(Default)]
struct Shapes(HashMap<TypeId, Walker>);

impl Shapes {
    fn sequence<S: Sequence>(&mut self) -> &mut Self {
        self.0.insert(TypeId::of::<S>(), walk_sequence::<S>);
        self
    }

    fn mapping<M: Mapping>(&mut self) -> &mut Self {
        self.0.insert(TypeId::of::<M>(), walk_mapping::<M>);
        self
    }

    fn indirect<I: Indirect>(&mut self) -> &mut Self {
        self.0.insert(TypeId::of::<I>(), walk_indirect::<I>);
        self
    }

    /// Every growable or keyed container holding `T`.
    fn around<T: Loggable>(&mut self) -> &mut Self {
        self.indirect::<Option<T>>()
            .indirect::<Box<T>>()
            .indirect::<Arc<T>>()
            .sequence::<Vec<T>>()
            .sequence::<VecDeque<T>>()
            .sequence::<&'static [T]>()
            .sequence::<Box<[T]>>()
            .mapping::<HashMap<String, T>>()
            .mapping::<HashMap<&'static str, T>>()
            .mapping::<BTreeMap<String, T>>()
            .mapping::<BTreeMap<&'static str, T>>()
    }

    fn arrays<T: Loggable>(&mut self) -> &mut Self {
        array_lengths!(self, T;
            0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16
            17 18 19 20 21 22 23 24 25 26 27 28 29 30 31 32)
    }

    /// `T` in every container, arrays up to 32 elements, and the common
    /// containers nested one level (`Vec<Vec<T>>`, `Option<Vec<T>>`,
    /// `HashMap<String, Vec<T>>`, ...).
    fn element<T: Loggable>(&mut self) -> &mut Self {
        self.around::<T>()
            .arrays::<T>()
            .around::<Vec<T>>()
            .around::<Option<T>>()
            .around::<HashMap<String, T>>()
            .around::<BTreeMap<String, T>>()
    }
}

static SHAPES: OnceLock<HashMap<TypeId, Walker>> = OnceLock::new();

fn shapes() -> &'static HashMap<TypeId, Walker> {
    SHAPES.get_or_init(|| {
        let mut shapes = Shapes::default();
        shapes
            .element::<Box<dyn Loggable>>()
            .element::<Value>()
            .element::<serde_json::Value>()
            .element::<String>()
            .element::<&'static str>()
            .element::<bool>()
            .element::<char>()
            .element::<i8>()
            .element::<i16>()
            .element::<i32>()
            .element::<i64>()
            .element::<isize>()
            .element::<u8>()
            .element::<u16>()
            .element::<u32>()
            .element::<u64>()
            .element::<usize>()
            .element::<f32>()
            .element::<f64>()
            .element::<Duration>()
            .element::<TimeDelta>()
            .element::<SystemTime>()
            .element::<DateTime<Utc>>()
            .element::<Complex<f64>>();
        shapes.0
    })
}

/// Sequences, mappings and optional/boxed values of the common element
/// types, including fixed arrays and one level of nesting. Deeper or
/// heterogeneous nesting goes through `Box<dyn Loggable>` (see `list!`).
///
/// `HashMap` inputs iterate in hash order, so the entry order of the
/// resulting [`Value::Map`] is not stable between calls. `BTreeMap` inputs
/// come out sorted by key.
fn container(any: &dyn Any, depth: usize) -> Option<Value> {
    let walk = shapes().get(&any.type_id())?;
    walk(any, depth)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn signed(v: i128) -> Value {
    i64::try_from(v).map_or_else(|_| Value::String(v.to_string()), Value::Int64)
}

/// Values above `i64::MAX` keep their exact decimal form instead of wrapping.
fn unsigned(v: u128) -> Value {
    i64::try_from(v).map_or_else(|_| Value::String(v.to_string()), Value::Int64)
}

fn system_time(t: SystemTime) -> Value {
    let nanos = match t.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_nanos()).ok(),
        Err(before) => i64::try_from(before.duration().as_nanos()).ok().map(|n| -n),
    };
    nanos.map_or_else(|| Value::String(format!("{t:?}")), Value::Int64)
}

fn date_time<Tz: TimeZone>(t: &DateTime<Tz>) -> Value
where
    Tz::Offset: fmt::Display,
{
    t.timestamp_nanos_opt()
        .map_or_else(|| Value::String(t.to_rfc3339()), Value::Int64)
}

fn from_json(v: &serde_json::Value, depth: usize) -> Value {
    use serde_json::Value as Json;

    match v {
        Json::Null => Value::Empty,
        Json::Bool(b) => Value::Bool(*b),
        Json::String(s) => Value::String(s.clone()),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int64(i)
            } else if let Some(u) = n.as_u64() {
                unsigned(u128::from(u))
            } else {
                n.as_f64()
                    .map_or_else(|| Value::String(n.to_string()), Value::Float64)
            }
        }
        Json::Array(_) | Json::Object(_) if depth >= MAX_DEPTH => Value::String(v.to_string()),
        Json::Array(items) => Value::Slice(items.iter().map(|item| from_json(item, depth + 1)).collect()),
        Json::Object(entries) => Value::Map(
            entries
                .iter()
                .map(|(k, item)| KeyValue::new(k.as_str(), from_json(item, depth + 1)))
                .collect(),
        ),
    }
}

fn slice_of<'a>(items: impl Iterator<Item = &'a dyn Loggable>, depth: usize) -> Value {
    Value::Slice(items.map(|item| normalize_at(item, depth + 1)).collect())
}

fn map_of<'a>(entries: impl Iterator<Item = (&'a str, &'a dyn Loggable)>, depth: usize) -> Value {
    Value::Map(
        entries
            .map(|(key, item)| KeyValue::new(key, normalize_at(item, depth + 1)))
            .collect(),
    )
}

fn fallback(value: &dyn Loggable) -> Value {
    let dump = format!("{value:?}");
    let type_name = value.type_name();
    if is_named_struct(type_name, &dump) {
        Value::String(dump)
    } else {
        Value::String(format!("unhandled: ({type_name}) {dump}"))
    }
}

fn unhandled(value: &dyn Loggable) -> Value {
    Value::String(format!("unhandled: ({}) {value:?}", value.type_name()))
}

/// A derived `Debug` dump of a struct with named fields starts with the
/// type's own name followed by ` {`.
fn is_named_struct(type_name: &str, dump: &str) -> bool {
    let base = type_name.split('<').next().unwrap_or(type_name);
    let short = base.rsplit("::").next().unwrap_or(base);
    !short.is_empty()
        && dump
            .strip_prefix(short)
            .is_some_and(|rest| rest.starts_with(" {"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
