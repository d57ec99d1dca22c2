use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use clap::{Parser, ValueEnum};
use logbridge::backends::{forward, JsonLogger};
use logbridge::config::{BackendKind, BridgeConfig};
use logbridge::{Complex, LogSink, RuntimeInfo, Sink};

#[derive(Parser)]
#[command(name = "logbridge-demo", about = "Emit sample records through a logbridge sink")]
struct Cli {
    /// Config file (defaults to $XDG_CONFIG_HOME/logbridge/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured backend.
    #[arg(long, value_enum)]
    backend: Option<BackendArg>,

    /// Highest verbosity level to emit info samples at.
    #[arg(short, long, default_value_t = 2)]
    verbosity: u32,

    /// Log logbridge's own diagnostics at debug level to stderr.
    #[arg(long)]
    debug: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Json,
    Tracing,
    Memory,
    Channel,
    Noop,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Json => BackendKind::Json,
            BackendArg::Tracing => BackendKind::Tracing,
            BackendArg::Memory => BackendKind::Memory,
            BackendArg::Channel => BackendKind::Channel,
            BackendArg::Noop => BackendKind::Noop,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "debug" } else { "warn,logbridge=trace" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let mut cfg = match &cli.config {
        Some(path) => BridgeConfig::load_from(path)?,
        None => BridgeConfig::load()?,
    };
    if let Some(kind) = cli.backend {
        cfg.backend.kind = kind.into();
    }
    tracing::debug!(backend = ?cfg.backend.kind, scope = %cfg.scope.name, "config loaded");

    let (sink, rx) = logbridge::sink_from_config(&cfg);
    let drain = rx.map(|rx| tokio::spawn(forward(rx, Arc::new(JsonLogger::stdout()))));

    emit_samples(&sink, cli.verbosity);
    drop(sink);

    if let Some(drain) = drain {
        let forwarded = drain.await?;
        tracing::debug!(forwarded, "channel drained");
    }
    Ok(())
}

fn emit_samples(root: &Sink, verbosity: u32) {
    root.init(RuntimeInfo { call_depth: 1 });
    let sink = root
        .derive_name("demo")
        .derive_values(&[&"pid", &std::process::id()]);

    for level in 0..=verbosity {
        if sink.enabled(level) {
            sink.info(level, "verbosity sample", &[&"level", &level]);
        }
    }

    let mut limits = BTreeMap::new();
    limits.insert("max_conns", 64_u32);
    limits.insert("max_idle", 8_u32);

    sink.info(
        0,
        "value kinds",
        &[
            &"elapsed", &Duration::from_millis(1500),
            &"at", &SystemTime::now(),
            &"tags", &vec!["edge", "canary"],
            &"limits", &limits,
            &"big", &u64::MAX,
            &"phase", &Complex::new(1.0_f64, -0.5),
            &"payload", &b"\x00\x01".to_vec(),
        ],
    );

    let db = sink.derive_name("db");
    let err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
    db.error(Some(&err), "query failed", &[&"attempt", &3, &"dangling"]);
}
