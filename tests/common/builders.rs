//! Test builders — ergonomic constructors for sinks and records.
//!
//! These builders are designed for readability in test assertions, not for
//! production use. They panic on unexpected state rather than returning
//! `Result`.

use std::sync::Arc;

use logbridge::backends::MemoryLogger;
use logbridge::{KeyValue, Record, Severity, Sink, SinkOptions, Value};

// ---------------------------------------------------------------------------
// SinkHarness
// ---------------------------------------------------------------------------

/// A [`Sink`] wired to an in-memory backend.
///
/// # Example
///
/// ```rust
/// let h = SinkHarness::new();
/// h.sink.info(0, "hello", &[&"k", &1]);
/// let record = h.single();
/// ```
pub struct SinkHarness {
    pub sink: Sink,
    pub memory: MemoryLogger,
}

impl SinkHarness {
    pub fn new() -> Self {
        Self::with_memory(MemoryLogger::new())
    }

    /// Harness whose backend reports severities below `min` disabled.
    pub fn with_min_severity(min: Severity) -> Self {
        Self::with_memory(MemoryLogger::new().with_min_severity(min))
    }

    fn with_memory(memory: MemoryLogger) -> Self {
        let sink = Sink::new(SinkOptions::new().provider(Arc::new(memory.clone())));
        Self { sink, memory }
    }

    pub fn records(&self) -> Vec<Record> {
        self.memory.records()
    }

    /// The only record emitted so far. Panics if there is not exactly one.
    pub fn single(&self) -> Record {
        let mut records = self.memory.take();
        assert_eq!(
            records.len(),
            1,
            "expected exactly one record, got {}: {:#?}",
            records.len(),
            records
        );
        records.remove(0)
    }
}

// ---------------------------------------------------------------------------
// Convenience constructors
// ---------------------------------------------------------------------------

pub fn kv(key: &str, value: impl Into<Value>) -> KeyValue {
    KeyValue::new(key, value)
}

pub fn string(s: &str) -> Value {
    Value::String(s.to_string())
}
