//! Buffered backend — hands records to a bounded `tokio` channel.
//!
//! [`ChannelLogger::emit`] never blocks. A record is dropped (and counted)
//! when the call's deadline has already passed, when the channel is full, or
//! when the receiving side is gone. [`forward`] drains the receiver into
//! another logger on a background task.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};

use logbridge_core::{Context, InstrumentationScope, Logger, LoggerProvider, Record, Severity};

/// Create a logger and the receiver its records arrive on. A capacity of 0 is
/// treated as 1.
pub fn channel(capacity: usize) -> (ChannelLogger, mpsc::Receiver<Record>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let logger = ChannelLogger {
        tx,
        min_severity: Severity::UNDEFINED,
        dropped: Arc::new(AtomicU64::new(0)),
    };
    (logger, rx)
}

#[derive(Debug, Clone)]
pub struct ChannelLogger {
    tx: mpsc::Sender<Record>,
    min_severity: Severity,
    dropped: Arc<AtomicU64>,
}

impl ChannelLogger {
    pub fn with_min_severity(mut self, min: Severity) -> Self {
        self.min_severity = min;
        self
    }

    /// Records dropped so far, across all clones.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn drop_record(&self, reason: &'static str) {
        let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::warn!(reason, dropped = total, "log record dropped");
    }
}

impl Logger for ChannelLogger {
    fn emit(&self, cx: &Context, record: Record) {
        if record.severity < self.min_severity {
            return;
        }
        if cx.is_expired() {
            self.drop_record("deadline exceeded");
            return;
        }
        match self.tx.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => self.drop_record("channel full"),
            Err(TrySendError::Closed(_)) => self.drop_record("receiver closed"),
        }
    }

    fn enabled(&self, _cx: &Context, probe: &Record) -> bool {
        !self.tx.is_closed() && probe.severity >= self.min_severity
    }
}

impl LoggerProvider for ChannelLogger {
    fn logger(&self, _scope: &InstrumentationScope) -> Arc<dyn Logger> {
        Arc::new(self.clone())
    }
}

/// Drain `rx` into `into` until every sender is gone. Returns the number of
/// records forwarded.
pub async fn forward(mut rx: mpsc::Receiver<Record>, into: Arc<dyn Logger>) -> u64 {
    let cx = Context::background();
    let mut forwarded = 0;
    while let Some(record) = rx.recv().await {
        into.emit(&cx, record);
        forwarded += 1;
    }
    tracing::debug!(forwarded, "log channel closed");
    forwarded
}
