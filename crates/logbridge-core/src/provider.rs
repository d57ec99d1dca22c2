//! Backend contract — the logs API a [`Sink`](crate::sink::Sink) emits into.
//!
//! A [`LoggerProvider`] hands out [`Logger`]s for an [`InstrumentationScope`].
//! The sink resolves its logger once at construction and then only calls
//! [`Logger::emit`] and [`Logger::enabled`]. What a logger does with a record
//! (buffering, export, dropping) is its own business.

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use crate::types::Record;

/// Default instrumentation scope name.
pub const DEFAULT_SCOPE_NAME: &str = "logbridge";

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Deadline-aware call context passed along with every backend call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Context {
    deadline: Option<Instant>,
}

impl Context {
    /// A context with no deadline.
    pub const fn background() -> Self {
        Self { deadline: None }
    }

    pub fn with_deadline(self, deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    /// Deadline `timeout` from now. Saturates instead of panicking on
    /// overflow.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let now = Instant::now();
        self.with_deadline(now.checked_add(timeout).unwrap_or(now))
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// Identity under which a sink's logger is requested from the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentationScope {
    pub name: String,
    pub version: Option<String>,
    pub schema_url: Option<String>,
}

impl Default for InstrumentationScope {
    fn default() -> Self {
        Self {
            name: DEFAULT_SCOPE_NAME.to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
            schema_url: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Backend logger. Both calls are fire-and-forget from the sink's side.
pub trait Logger: Send + Sync {
    /// Hand a finished record to the backend.
    fn emit(&self, cx: &Context, record: Record);

    /// Whether a record like `probe` would be emitted. The sink passes a
    /// record carrying only a severity.
    fn enabled(&self, cx: &Context, probe: &Record) -> bool;
}

pub trait LoggerProvider: Send + Sync {
    fn logger(&self, scope: &InstrumentationScope) -> Arc<dyn Logger>;
}

impl<L: Logger + ?Sized> Logger for Arc<L> {
    fn emit(&self, cx: &Context, record: Record) {
        (**self).emit(cx, record);
    }

    fn enabled(&self, cx: &Context, probe: &Record) -> bool {
        (**self).enabled(cx, probe)
    }
}

// ---------------------------------------------------------------------------
// No-op backend
// ---------------------------------------------------------------------------

/// Drops every record and reports itself disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn emit(&self, _cx: &Context, _record: Record) {}

    fn enabled(&self, _cx: &Context, _probe: &Record) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProvider;

impl LoggerProvider for NoopProvider {
    fn logger(&self, _scope: &InstrumentationScope) -> Arc<dyn Logger> {
        Arc::new(NoopLogger)
    }
}

// ---------------------------------------------------------------------------
// Process-wide provider
// ---------------------------------------------------------------------------

static GLOBAL_PROVIDER: OnceLock<Arc<dyn LoggerProvider>> = OnceLock::new();

/// Errors from installing the process-wide provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("a global logger provider is already installed")]
    AlreadyInstalled,
}

/// Install the process-wide provider used by sinks built without an explicit
/// one. Can only be done once.
pub fn set_global_provider(provider: Arc<dyn LoggerProvider>) -> Result<(), ProviderError> {
    GLOBAL_PROVIDER
        .set(provider)
        .map_err(|_| ProviderError::AlreadyInstalled)?;
    tracing::debug!("global logger provider installed");
    Ok(())
}

/// The installed process-wide provider, or [`NoopProvider`] if none is.
pub fn global_provider() -> Arc<dyn LoggerProvider> {
    match GLOBAL_PROVIDER.get() {
        Some(provider) => Arc::clone(provider),
        None => Arc::new(NoopProvider),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
