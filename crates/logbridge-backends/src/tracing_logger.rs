//! `tracing` backend — re-emits records as `tracing` events.
//!
//! Severity bands map to `tracing` levels (`TRACE*` → TRACE, `DEBUG*` →
//! DEBUG, `INFO*` → INFO, `WARN*` → WARN, `ERROR*`/`FATAL*` and above →
//! ERROR). Events use the `logbridge` target; attributes are rendered into a
//! single `attributes` field as `key=value` pairs.

use std::fmt;
use std::sync::Arc;

use tracing::Level;

use logbridge_core::{
    Context, InstrumentationScope, KeyValue, Logger, LoggerProvider, Record, Severity,
};

/// Target used for every event.
pub const TARGET: &str = "logbridge";

#[derive(Debug, Clone)]
pub struct TracingLogger {
    scope: String,
    min_severity: Severity,
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self {
            scope: InstrumentationScope::default().name,
            min_severity: Severity::UNDEFINED,
        }
    }
}

impl TracingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_severity(mut self, min: Severity) -> Self {
        self.min_severity = min;
        self
    }
}

/// The `tracing` level a severity is reported at.
pub fn level_for(severity: Severity) -> Level {
    match severity.number() {
        0..=4 => Level::TRACE,
        5..=8 => Level::DEBUG,
        9..=12 => Level::INFO,
        13..=16 => Level::WARN,
        _ => Level::ERROR,
    }
}

struct Attributes<'a>(&'a [KeyValue]);

impl fmt::Display for Attributes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, kv) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}={}", kv.key, kv.value)?;
        }
        Ok(())
    }
}

impl Logger for TracingLogger {
    fn emit(&self, _cx: &Context, record: Record) {
        if record.severity < self.min_severity {
            return;
        }
        let attributes = Attributes(&record.attributes);

        macro_rules! emit_at {
            ($level:expr) => {
                tracing::event!(
                    target: TARGET,
                    $level,
                    scope = %self.scope,
                    severity = %record.severity,
                    attributes = %attributes,
                    "{}",
                    record.body
                )
            };
        }

        let level = level_for(record.severity);
        if level == Level::ERROR {
            emit_at!(Level::ERROR);
        } else if level == Level::WARN {
            emit_at!(Level::WARN);
        } else if level == Level::INFO {
            emit_at!(Level::INFO);
        } else if level == Level::DEBUG {
            emit_at!(Level::DEBUG);
        } else {
            emit_at!(Level::TRACE);
        }
    }

    fn enabled(&self, _cx: &Context, probe: &Record) -> bool {
        if probe.severity < self.min_severity {
            return false;
        }
        let level = level_for(probe.severity);
        if level == Level::ERROR {
            tracing::enabled!(target: TARGET, Level::ERROR)
        } else if level == Level::WARN {
            tracing::enabled!(target: TARGET, Level::WARN)
        } else if level == Level::INFO {
            tracing::enabled!(target: TARGET, Level::INFO)
        } else if level == Level::DEBUG {
            tracing::enabled!(target: TARGET, Level::DEBUG)
        } else {
            tracing::enabled!(target: TARGET, Level::TRACE)
        }
    }
}

impl LoggerProvider for TracingLogger {
    fn logger(&self, scope: &InstrumentationScope) -> Arc<dyn Logger> {
        Arc::new(Self {
            scope: scope.name.clone(),
            min_severity: self.min_severity,
        })
    }
}
