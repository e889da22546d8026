//! Tracing setup shared by Folio binaries.
//!
//! Configured through the environment:
//!
//! - `LOG_LEVEL`: default filter when `RUST_LOG` is unset (`info`)
//! - `LOG_OUTPUT`: `console`, `file`, `both` or `none` (`console`)
//! - `LOG_FORMAT`: `human` or `json` (`human`)
//! - `LOG_FILE_PATH`: file written when output includes `file` (`/tmp/folio.log`),
//!   rotated daily

use std::env;
use std::path::{Path, PathBuf};
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::MakeWriter, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

const DEFAULT_LOG_FILE: &str = "/tmp/folio.log";

/// Noisy dependencies capped regardless of the configured level.
const QUIET_TARGETS: [&str; 3] = ["tokio=warn", "hyper=warn", "sqlx=warn"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Console,
    File,
    Both,
    None,
}

impl LogOutput {
    fn parse(value: &str) -> Self {
        match value {
            "file" => LogOutput::File,
            "both" => LogOutput::Both,
            "none" => LogOutput::None,
            _ => LogOutput::Console,
        }
    }

    fn to_console(self) -> bool {
        matches!(self, LogOutput::Console | LogOutput::Both)
    }

    fn to_file(self) -> bool {
        matches!(self, LogOutput::File | LogOutput::Both)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Human,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value == "json" {
            LogFormat::Json
        } else {
            LogFormat::Human
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    pub output: LogOutput,
    pub format: LogFormat,
    pub file_path: PathBuf,
}

impl LogConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            output: lookup("LOG_OUTPUT").map_or(LogOutput::Console, |v| LogOutput::parse(&v)),
            format: lookup("LOG_FORMAT").map_or(LogFormat::Human, |v| LogFormat::parse(&v)),
            file_path: lookup("LOG_FILE_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_LOG_FILE), PathBuf::from),
        }
    }

    fn filter(&self) -> EnvFilter {
        let mut filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));
        for target in QUIET_TARGETS {
            if let Ok(directive) = target.parse() {
                filter = filter.add_directive(directive);
            }
        }
        filter
    }
}

/// Initializes the global tracing subscriber based on environment variables.
///
/// Keep the returned guard alive for as long as file logging should flush.
pub fn init_subscriber() -> Option<WorkerGuard> {
    init_with(&LogConfig::from_env())
}

pub fn init_with(config: &LogConfig) -> Option<WorkerGuard> {
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    let mut guard = None;

    if config.output.to_console() {
        layers.push(fmt_layer(config.format, std::io::stdout, true));
    }

    if config.output.to_file() {
        let (dir, file_name) = split_log_path(&config.file_path);
        let appender = tracing_appender::rolling::daily(dir, file_name);
        let (writer, worker_guard) = tracing_appender::non_blocking(appender);
        guard = Some(worker_guard);
        layers.push(fmt_layer(config.format, writer, false));
    }

    // A subscriber may already be installed, e.g. by a test harness.
    let _ = tracing_subscriber::registry()
        .with(layers)
        .with(config.filter())
        .try_init();

    guard
}

fn fmt_layer<S, W>(format: LogFormat, writer: W, ansi: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi);

    match format {
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Human => layer.pretty().boxed(),
    }
}

fn split_log_path(path: &Path) -> (PathBuf, PathBuf) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("/tmp"), Path::to_path_buf);
    let file_name = path
        .file_name()
        .map_or_else(|| PathBuf::from("folio.log"), PathBuf::from);
    (dir, file_name)
}
