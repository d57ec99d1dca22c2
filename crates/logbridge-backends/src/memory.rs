//! In-memory backend — keeps every emitted record for later inspection.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use logbridge_core::{Context, InstrumentationScope, Logger, LoggerProvider, Record, Severity};

/// Shared record buffer. Clones (and loggers handed out as a provider) all
/// append to the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogger {
    records: Arc<Mutex<Vec<Record>>>,
    min_severity: Severity,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report severities below `min` as disabled and drop them on emit.
    pub fn with_min_severity(mut self, min: Severity) -> Self {
        self.min_severity = min;
        self
    }

    /// Snapshot of everything emitted so far, oldest first.
    pub fn records(&self) -> Vec<Record> {
        self.lock().clone()
    }

    /// Remove and return everything emitted so far.
    pub fn take(&self) -> Vec<Record> {
        std::mem::take(&mut *self.lock())
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Record>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Logger for MemoryLogger {
    fn emit(&self, _cx: &Context, record: Record) {
        if record.severity < self.min_severity {
            return;
        }
        self.lock().push(record);
    }

    fn enabled(&self, _cx: &Context, probe: &Record) -> bool {
        probe.severity >= self.min_severity
    }
}

impl LoggerProvider for MemoryLogger {
    fn logger(&self, _scope: &InstrumentationScope) -> Arc<dyn Logger> {
        Arc::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_loggers_share_the_buffer() {
        let memory = MemoryLogger::new();
        let logger = memory.logger(&InstrumentationScope::default());
        logger.emit(&Context::background(), Record::probe(Severity::INFO));
        assert_eq!(memory.len(), 1);
        assert_eq!(memory.take().len(), 1);
        assert!(memory.is_empty());
    }

    #[test]
    fn threshold_filters_and_disables() {
        let memory = MemoryLogger::new().with_min_severity(Severity::WARN);
        let cx = Context::background();
        assert!(!memory.enabled(&cx, &Record::probe(Severity::INFO)));
        assert!(memory.enabled(&cx, &Record::probe(Severity::ERROR)));
        memory.emit(&cx, Record::probe(Severity::INFO));
        memory.emit(&cx, Record::probe(Severity::ERROR));
        let records = memory.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].severity, Severity::ERROR);
    }
}
