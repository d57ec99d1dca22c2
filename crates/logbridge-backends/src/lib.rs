//! logbridge-backends — logs backends for logbridge sinks.
//!
//! Each backend implements both [`Logger`](logbridge_core::Logger) and
//! [`LoggerProvider`], so it can be handed to
//! [`SinkOptions::provider`](logbridge_core::SinkOptions::provider) directly.
//! Every backend takes a minimum severity: lower records are reported
//! disabled and dropped on emit.

pub mod channel;
pub mod json;
pub mod memory;
pub mod tracing_logger;

use std::sync::Arc;

use logbridge_core::config::{BackendConfig, BackendKind};
use logbridge_core::provider::NoopProvider;
use logbridge_core::{LoggerProvider, Record};
use tokio::sync::mpsc;

pub use channel::{channel, forward, ChannelLogger};
pub use json::JsonLogger;
pub use memory::MemoryLogger;
pub use tracing_logger::TracingLogger;

/// A backend selected from configuration.
pub enum Backend {
    Json(JsonLogger<std::io::Stdout>),
    Tracing(TracingLogger),
    Memory(MemoryLogger),
    /// The receiver must be drained (see [`forward`]) or records pile up
    /// until the channel is full.
    Channel(ChannelLogger, mpsc::Receiver<Record>),
    Noop,
}

impl Backend {
    pub fn from_config(cfg: &BackendConfig) -> Self {
        let min = cfg.min_severity;
        tracing::debug!(kind = ?cfg.kind, min_severity = %min, "building log backend");
        match cfg.kind {
            BackendKind::Json => Backend::Json(JsonLogger::stdout().with_min_severity(min)),
            BackendKind::Tracing => Backend::Tracing(TracingLogger::new().with_min_severity(min)),
            BackendKind::Memory => Backend::Memory(MemoryLogger::new().with_min_severity(min)),
            BackendKind::Channel => {
                let (logger, rx) = channel(cfg.channel_capacity);
                Backend::Channel(logger.with_min_severity(min), rx)
            }
            BackendKind::Noop => Backend::Noop,
        }
    }

    /// The provider to build sinks with, and the channel receiver when the
    /// backend is buffered.
    pub fn into_parts(self) -> (Arc<dyn LoggerProvider>, Option<mpsc::Receiver<Record>>) {
        match self {
            Backend::Json(logger) => (Arc::new(logger), None),
            Backend::Tracing(logger) => (Arc::new(logger), None),
            Backend::Memory(logger) => (Arc::new(logger), None),
            Backend::Channel(logger, rx) => (Arc::new(logger), Some(rx)),
            Backend::Noop => (Arc::new(NoopProvider), None),
        }
    }
}
