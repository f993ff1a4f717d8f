#![expect(clippy::print_stderr, reason = "Tracing not initialized yet")]

//! Tracing subscriber setup for both the service and the CLI.
//!
//! `RUST_LOG` picks the filter. `CMDEXEC_LOG` sends output to a file,
//! `CMDEXEC_LOG_FORMAT=json` switches to JSON lines and
//! `CMDEXEC_LOG_STREAM=stdout` moves console output off stderr.

use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

const LOG_FILE_ENV: &str = "CMDEXEC_LOG";
const LOG_FORMAT_ENV: &str = "CMDEXEC_LOG_FORMAT";
const LOG_STREAM_ENV: &str = "CMDEXEC_LOG_STREAM";

/// Keeps the non-blocking file writer flushing until dropped.
#[derive(Debug)]
pub struct TelemetryGuard {
    _guard: Option<WorkerGuard>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogStream {
    Stderr,
    Stdout,
}

#[derive(Debug, PartialEq, Eq)]
struct LogSettings {
    file: Option<PathBuf>,
    format: LogFormat,
    stream: LogStream,
}

impl LogSettings {
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let normalized = |key: &str| lookup(key).map(|v| v.trim().to_lowercase());
        Self {
            file: lookup(LOG_FILE_ENV)
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
            format: match normalized(LOG_FORMAT_ENV).as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
            stream: match normalized(LOG_STREAM_ENV).as_deref() {
                Some("stdout") => LogStream::Stdout,
                _ => LogStream::Stderr,
            },
        }
    }

    /// Writer, file guard and whether ANSI colors are appropriate.
    fn writer(&self) -> (BoxMakeWriter, Option<WorkerGuard>, bool) {
        if let Some(path) = &self.file {
            match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => {
                    let (non_blocking, guard) = tracing_appender::non_blocking(file);
                    return (BoxMakeWriter::new(non_blocking), Some(guard), false);
                }
                Err(err) => {
                    eprintln!("Warning: failed to open log file {}: {err}", path.display());
                }
            }
        }
        match self.stream {
            LogStream::Stdout => (
                BoxMakeWriter::new(std::io::stdout),
                None,
                std::io::stdout().is_terminal(),
            ),
            LogStream::Stderr => (
                BoxMakeWriter::new(std::io::stderr),
                None,
                std::io::stderr().is_terminal(),
            ),
        }
    }
}

/// Installs the global subscriber. `default_level` applies when `RUST_LOG`
/// is unset or invalid. A second call leaves the first subscriber in place.
pub fn init_tracing(default_level: &str) -> TelemetryGuard {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let settings = LogSettings::from_lookup(|key| std::env::var(key).ok());
    let (writer, guard, ansi) = settings.writer();

    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = match settings.format {
        LogFormat::Json => Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .json()
                .with_writer(writer)
                .finish(),
        ),
        LogFormat::Text => Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_thread_names(true)
                .with_ansi(ansi)
                .with_writer(writer)
                .finish(),
        ),
    };

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return TelemetryGuard { _guard: None };
    }
    TelemetryGuard { _guard: guard }
}
