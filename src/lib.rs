//! logbridge — leveled key/value logging into an OpenTelemetry-style logs
//! backend.
//!
//! This crate re-exports the core sink and value model and the bundled
//! backends so that integration tests and binaries can import them from one
//! place.
//!
//! # Architecture
//!
//! ```text
//! LogSink::info / error ──► Sink ──► normalizer ──► Record ──► Logger
//!                                                               │
//!                      json · tracing · memory · channel ◄──────┘
//! ```
//!
//! The sink is synchronous and lock-free. Only the channel backend defers
//! work, through a `tokio` mpsc channel drained by [`backends::forward`].

pub use logbridge_backends as backends;
pub use logbridge_core::*;

use tokio::sync::mpsc;

use logbridge_backends::Backend;
use logbridge_core::config::BridgeConfig;

/// Build a sink wired to the backend named in `cfg`.
///
/// For the channel backend the receiver is returned as well; the caller is
/// expected to drain it (usually with [`backends::forward`]).
pub fn sink_from_config(cfg: &BridgeConfig) -> (Sink, Option<mpsc::Receiver<Record>>) {
    let (provider, rx) = Backend::from_config(&cfg.backend).into_parts();
    let sink = Sink::new(cfg.sink_options().provider(provider));
    (sink, rx)
}
