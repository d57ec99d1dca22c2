//! logbridge-core — value model, normalizer and sink for logbridge.
//!
//! This crate turns leveled key/value logging calls into backend records.
//!
//! # Architecture
//!
//! ```text
//! caller ──► Sink ──► normalize_pairs ──► normalize ──► Record ──► Logger
//!             │                                                    ▲
//!             └── name + accumulated values ───────────────────────┘
//! ```
//!
//! The sink holds no locks and spawns nothing; buffering and export are up to
//! the [`Logger`] it was built with.

pub mod config;
pub mod normalizer;
pub mod provider;
pub mod sink;
pub mod types;

pub use normalizer::{error_value, normalize, normalize_pairs, valuer, Loggable, Valuer};
pub use provider::{
    global_provider, set_global_provider, Context, InstrumentationScope, Logger, LoggerProvider,
};
pub use sink::{LogSink, RuntimeInfo, Sink, SinkOptions};
pub use types::{Complex, KeyValue, Record, Severity, Value};
