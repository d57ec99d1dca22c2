//! Configuration types for logbridge.
//!
//! [`BridgeConfig::load`] layers, in order: the built-in defaults, the
//! optional file at `$XDG_CONFIG_HOME/logbridge/config.toml`, and
//! `LOGBRIDGE_*` environment variables (`LOGBRIDGE_BACKEND__KIND=tracing`).
//! [`BridgeConfig::defaults`] returns the defaults without touching the
//! filesystem or environment (useful in tests).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::provider::{InstrumentationScope, DEFAULT_SCOPE_NAME};
use crate::sink::SinkOptions;
use crate::types::Severity;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[scope]
name = "logbridge"

[backend]
kind             = "json"
min_severity     = 1
channel_capacity = 1024
emit_timeout_ms  = 0
"#;

const ENV_PREFIX: &str = "LOGBRIDGE";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration from {path}")]
    Load {
        path: PathBuf,
        #[source]
        source: config::ConfigError,
    },
    #[error("invalid configuration")]
    Invalid(#[from] config::ConfigError),
}

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub scope: ScopeConfig,
    #[serde(default)]
    pub backend: BackendConfig,
}

/// `[scope]` section: the instrumentation scope the sink requests its logger
/// under.
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeConfig {
    #[serde(default = "default_scope_name")]
    pub name: String,
    #[serde(default = "default_scope_version")]
    pub version: Option<String>,
    #[serde(default)]
    pub schema_url: Option<String>,
}

fn default_scope_name() -> String { DEFAULT_SCOPE_NAME.to_string() }
fn default_scope_version() -> Option<String> { Some(env!("CARGO_PKG_VERSION").to_string()) }

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            name: default_scope_name(),
            version: default_scope_version(),
            schema_url: None,
        }
    }
}

/// Which backend a binary wires the sink to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Json,
    Tracing,
    Memory,
    Channel,
    Noop,
}

/// `[backend]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_kind")]
    pub kind: BackendKind,
    /// Records below this severity number are reported disabled.
    #[serde(default = "default_min_severity")]
    pub min_severity: Severity,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Per-call deadline handed to the backend; `0` means none.
    #[serde(default)]
    pub emit_timeout_ms: u64,
}

fn default_kind() -> BackendKind { BackendKind::Json }
fn default_min_severity() -> Severity { Severity::TRACE }
fn default_channel_capacity() -> usize { 1024 }

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            min_severity: default_min_severity(),
            channel_capacity: default_channel_capacity(),
            emit_timeout_ms: 0,
        }
    }
}

impl BackendConfig {
    pub fn emit_timeout(&self) -> Option<Duration> {
        (self.emit_timeout_ms > 0).then(|| Duration::from_millis(self.emit_timeout_ms))
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

impl BridgeConfig {
    /// Load from the default path and environment, layered on top of the
    /// built-in defaults. A missing file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_path())
    }

    /// Like [`BridgeConfig::load`] but reading the given file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        tracing::debug!(path = %path.display(), "loading logbridge config");
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .and_then(|cfg| cfg.try_deserialize::<Self>())
            .map_err(|source| ConfigError::Load {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Parse a TOML document layered over the defaults. No file or
    /// environment lookups.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Ok(config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }

    pub fn scope(&self) -> InstrumentationScope {
        InstrumentationScope {
            name: self.scope.name.clone(),
            version: self.scope.version.clone(),
            schema_url: self.scope.schema_url.clone(),
        }
    }

    /// Sink options carrying this config's scope and emit timeout. The
    /// provider is left to the caller.
    pub fn sink_options(&self) -> SinkOptions {
        let options = SinkOptions::new().scope(self.scope());
        match self.backend.emit_timeout() {
            Some(timeout) => options.emit_timeout(timeout),
            None => options,
        }
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("logbridge")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
