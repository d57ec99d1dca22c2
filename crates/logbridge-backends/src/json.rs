//! JSON lines backend — one compact JSON object per record.
//!
//! ```text
//! {"timestamp":"2024-01-15T10:00:00Z","severity_number":9,"severity_text":"INFO",
//!  "scope":"logbridge","body":"started","attributes":{"logger":"api","port":8080}}
//! ```
//!
//! Attributes keep their order; repeated keys are written repeatedly.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

use logbridge_core::types::AttributeMap;
use logbridge_core::{Context, InstrumentationScope, Logger, LoggerProvider, Record, Severity, Value};

#[derive(Serialize)]
struct JsonLine<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<DateTime<Utc>>,
    severity_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    severity_text: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<&'a str>,
    body: &'a Value,
    attributes: AttributeMap<'a>,
}

/// Encode one record as a JSON line (without the trailing newline).
pub fn encode_line(record: &Record, scope: Option<&str>) -> serde_json::Result<String> {
    serde_json::to_string(&JsonLine {
        timestamp: record.timestamp,
        severity_number: record.severity.number(),
        severity_text: record.severity.name(),
        scope,
        body: &record.body,
        attributes: AttributeMap(&record.attributes),
    })
}

/// Writes records as JSON lines to a shared writer.
pub struct JsonLogger<W> {
    writer: Arc<Mutex<W>>,
    scope: Option<String>,
    min_severity: Severity,
}

impl JsonLogger<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send + 'static> JsonLogger<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
            scope: None,
            min_severity: Severity::UNDEFINED,
        }
    }

    pub fn with_min_severity(mut self, min: Severity) -> Self {
        self.min_severity = min;
        self
    }

    /// Run `f` against the underlying writer (e.g. to read back a buffer).
    pub fn with_writer<R>(&self, f: impl FnOnce(&mut W) -> R) -> R {
        let mut guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()
    }
}

impl<W> Clone for JsonLogger<W> {
    fn clone(&self) -> Self {
        Self {
            writer: Arc::clone(&self.writer),
            scope: self.scope.clone(),
            min_severity: self.min_severity,
        }
    }
}

impl<W: Write + Send + 'static> Logger for JsonLogger<W> {
    fn emit(&self, _cx: &Context, record: Record) {
        if record.severity < self.min_severity {
            return;
        }
        let result = encode_line(&record, self.scope.as_deref())
            .map_err(io::Error::from)
            .and_then(|line| self.write_line(&line));
        if let Err(err) = result {
            tracing::warn!(error = %err, "failed to write json log record");
        }
    }

    fn enabled(&self, _cx: &Context, probe: &Record) -> bool {
        probe.severity >= self.min_severity
    }
}

impl<W: Write + Send + 'static> LoggerProvider for JsonLogger<W> {
    fn logger(&self, scope: &InstrumentationScope) -> Arc<dyn Logger> {
        let mut logger = self.clone();
        logger.scope = Some(scope.name.clone());
        Arc::new(logger)
    }
}
