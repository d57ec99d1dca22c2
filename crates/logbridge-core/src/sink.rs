//! Sink — adapts leveled key/value logging calls to backend [`Record`]s.
//!
//! A [`Sink`] carries a hierarchical name and a list of accumulated
//! attributes. Deriving a sink ([`LogSink::with_name`],
//! [`LogSink::with_values`]) never touches the parent: the derived sink gets
//! its own copy of the attribute list, so siblings never see each other's
//! additions and a sink can be shared across threads without locking.
//!
//! # Severity mapping
//!
//! | Call              | Severity                 |
//! |-------------------|--------------------------|
//! | `error(..)`       | `ERROR`                  |
//! | `info(level, ..)` | `INFO + level`           |
//! | `enabled(level)`  | `DEBUG + level` (probe)  |
//!
//! # Attribute order
//!
//! `logger` (when named), then `err` (when an error is given), then the
//! accumulated values, then the call's own pairs.

use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::normalizer::{error_chain, normalize_pairs, Loggable};
use crate::provider::{global_provider, Context, InstrumentationScope, Logger, LoggerProvider};
use crate::types::{KeyValue, Record, Severity, Value};

/// Attribute key carrying the sink's hierarchical name.
pub const NAME_KEY: &str = "logger";
/// Attribute key carrying the error passed to [`LogSink::error`].
pub const ERR_KEY: &str = "err";

/// Call-site metadata offered by the front-end. Nothing in it is recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeInfo {
    pub call_depth: usize,
}

// ---------------------------------------------------------------------------
// Front-end contract
// ---------------------------------------------------------------------------

/// Leveled logging capability set expected by the front-end.
///
/// `level` is a verbosity level: 0 is the default, larger numbers are more
/// detailed and less important.
pub trait LogSink: Send + Sync {
    fn init(&self, info: RuntimeInfo);

    fn enabled(&self, level: u32) -> bool;

    fn info(&self, level: u32, msg: &str, kvs: &[&dyn Loggable]);

    fn error(&self, err: Option<&(dyn Error + 'static)>, msg: &str, kvs: &[&dyn Loggable]);

    /// A new sink whose name is this one's with `/name` appended.
    fn with_name(&self, name: &str) -> Box<dyn LogSink>;

    /// A new sink with `kvs` appended to the accumulated attributes.
    fn with_values(&self, kvs: &[&dyn Loggable]) -> Box<dyn LogSink>;
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Construction options for [`Sink::new`].
#[derive(Clone, Default)]
pub struct SinkOptions {
    provider: Option<Arc<dyn LoggerProvider>>,
    scope: InstrumentationScope,
    emit_timeout: Option<Duration>,
}

impl SinkOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this provider instead of the process-wide one.
    pub fn provider(mut self, provider: Arc<dyn LoggerProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn scope(mut self, scope: InstrumentationScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn scope_name(mut self, name: impl Into<String>) -> Self {
        self.scope.name = name.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.scope.version = Some(version.into());
        self
    }

    pub fn schema_url(mut self, url: impl Into<String>) -> Self {
        self.scope.schema_url = Some(url.into());
        self
    }

    /// Deadline handed to the backend with every call.
    pub fn emit_timeout(mut self, timeout: Duration) -> Self {
        self.emit_timeout = Some(timeout);
        self
    }
}

impl fmt::Debug for SinkOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkOptions")
            .field("provider", &self.provider.as_ref().map(|_| "custom"))
            .field("scope", &self.scope)
            .field("emit_timeout", &self.emit_timeout)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct Sink {
    name: String,
    logger: Arc<dyn Logger>,
    values: Arc<[KeyValue]>,
    emit_timeout: Option<Duration>,
}

impl Sink {
    /// Build a sink, resolving its logger from the configured provider (or
    /// the process-wide one) once.
    pub fn new(options: SinkOptions) -> Self {
        let provider = options.provider.unwrap_or_else(global_provider);
        let logger = provider.logger(&options.scope);
        tracing::debug!(scope = %options.scope.name, "log sink created");
        Self {
            name: String::new(),
            logger,
            values: Arc::from(Vec::new()),
            emit_timeout: options.emit_timeout,
        }
    }

    /// Build a sink directly on top of a logger.
    pub fn from_logger(logger: Arc<dyn Logger>) -> Self {
        Self {
            name: String::new(),
            logger,
            values: Arc::from(Vec::new()),
            emit_timeout: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Accumulated attributes, oldest first.
    pub fn values(&self) -> &[KeyValue] {
        &self.values
    }

    /// Concrete form of [`LogSink::with_name`].
    pub fn derive_name(&self, segment: &str) -> Self {
        let mut name = String::with_capacity(self.name.len() + 1 + segment.len());
        if !self.name.is_empty() {
            name.push_str(&self.name);
            name.push('/');
        }
        name.push_str(segment);
        Self {
            name,
            logger: Arc::clone(&self.logger),
            values: Arc::clone(&self.values),
            emit_timeout: self.emit_timeout,
        }
    }

    /// Concrete form of [`LogSink::with_values`].
    pub fn derive_values(&self, kvs: &[&dyn Loggable]) -> Self {
        let added = normalize_pairs(kvs);
        let values = if added.is_empty() {
            Arc::clone(&self.values)
        } else {
            self.values.iter().cloned().chain(added).collect()
        };
        Self {
            name: self.name.clone(),
            logger: Arc::clone(&self.logger),
            values,
            emit_timeout: self.emit_timeout,
        }
    }

    /// Assemble the record for one leveled call.
    pub fn record(
        &self,
        err: Option<&(dyn Error + 'static)>,
        msg: &str,
        severity: Severity,
        kvs: &[&dyn Loggable],
    ) -> Record {
        let call_attrs = normalize_pairs(kvs);
        let mut attributes = Vec::with_capacity(2 + self.values.len() + call_attrs.len());

        if !self.name.is_empty() {
            attributes.push(KeyValue::new(NAME_KEY, self.name.as_str()));
        }
        if let Some(err) = err {
            attributes.push(KeyValue::new(ERR_KEY, Value::String(error_chain(err))));
        }
        attributes.extend(self.values.iter().cloned());
        attributes.extend(call_attrs);

        Record {
            timestamp: Some(Utc::now()),
            severity,
            body: Value::String(msg.to_string()),
            attributes,
        }
    }

    fn context(&self) -> Context {
        match self.emit_timeout {
            Some(timeout) => Context::background().with_timeout(timeout),
            None => Context::background(),
        }
    }

    fn log(
        &self,
        err: Option<&(dyn Error + 'static)>,
        msg: &str,
        severity: Severity,
        kvs: &[&dyn Loggable],
    ) {
        let record = self.record(err, msg, severity, kvs);
        self.logger.emit(&self.context(), record);
    }
}

impl LogSink for Sink {
    /// Call-site depth is dropped: records carry no source location.
    fn init(&self, _info: RuntimeInfo) {}

    fn enabled(&self, level: u32) -> bool {
        let probe = Record::probe(Severity::DEBUG.offset(level));
        self.logger.enabled(&self.context(), &probe)
    }

    fn info(&self, level: u32, msg: &str, kvs: &[&dyn Loggable]) {
        self.log(None, msg, Severity::INFO.offset(level), kvs);
    }

    fn error(&self, err: Option<&(dyn Error + 'static)>, msg: &str, kvs: &[&dyn Loggable]) {
        self.log(err, msg, Severity::ERROR, kvs);
    }

    fn with_name(&self, name: &str) -> Box<dyn LogSink> {
        Box::new(self.derive_name(name))
    }

    fn with_values(&self, kvs: &[&dyn Loggable]) -> Box<dyn LogSink> {
        Box::new(self.derive_values(kvs))
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("name", &self.name)
            .field("values", &self.values)
            .field("emit_timeout", &self.emit_timeout)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
