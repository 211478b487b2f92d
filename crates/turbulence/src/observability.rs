//! Logging setup for the CLI.
//!
//! Human-readable events go to stderr so stdout stays clean for reports and
//! the MCP protocol. When a log location is configured, every event passing
//! the filter is also written as JSON lines to a daily-rolling file.
//!
//! Filter precedence: `RUST_LOG`, then `-q`/`-v`, then the configured
//! `log_level`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

const LOG_PATH_ENV: &str = "TURBULENCE_LOG_PATH";
const LOG_DIR_ENV: &str = "TURBULENCE_LOG_DIR";
const LOG_FILE_PREFIX: &str = "turbulence.jsonl";

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// Target for the JSON log file, if any.
    pub file: Option<LogFile>,
    /// Most verbose level echoed to stderr.
    pub console_level: LevelFilter,
}

/// JSON log file target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFile {
    /// One fixed file, never rotated.
    Path(PathBuf),
    /// Daily-rolling files inside a directory.
    Dir(PathBuf),
}

impl ObservabilityConfig {
    /// Resolve the log file from the environment, falling back to the
    /// configured directory.
    pub fn from_env_with_overrides(config_log_dir: Option<PathBuf>) -> Self {
        Self::resolve(
            std::env::var_os(LOG_PATH_ENV).map(PathBuf::from),
            std::env::var_os(LOG_DIR_ENV).map(PathBuf::from),
            config_log_dir,
        )
    }

    fn resolve(
        env_path: Option<PathBuf>,
        env_dir: Option<PathBuf>,
        config_dir: Option<PathBuf>,
    ) -> Self {
        let file = env_path
            .map(LogFile::Path)
            .or_else(|| env_dir.or(config_dir).map(LogFile::Dir));
        Self {
            file,
            console_level: LevelFilter::WARN,
        }
    }

    /// Echo more (or less) to stderr.
    pub const fn with_console_level(mut self, level: LevelFilter) -> Self {
        self.console_level = level;
        self
    }
}

/// Build the event filter.
///
/// `RUST_LOG` wins when set and valid. Otherwise `-q` selects `error`, one
/// `-v` selects `debug`, two or more select `trace`, and without flags the
/// configured level applies.
pub fn env_filter(quiet: bool, verbose: u8, config_level: &str) -> EnvFilter {
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some()
        && let Ok(filter) = EnvFilter::try_from_default_env()
    {
        return filter;
    }
    EnvFilter::new(flag_level(quiet, verbose).unwrap_or(config_level))
}

/// Stderr level matching the verbosity flags.
///
/// Without flags only warnings and errors reach the terminal; the log file
/// still gets everything the filter lets through.
pub fn console_level(quiet: bool, verbose: u8) -> LevelFilter {
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        return LevelFilter::TRACE;
    }
    match flag_level(quiet, verbose) {
        Some("error") => LevelFilter::ERROR,
        Some("debug") => LevelFilter::DEBUG,
        Some(_) => LevelFilter::TRACE,
        None => LevelFilter::WARN,
    }
}

const fn flag_level(quiet: bool, verbose: u8) -> Option<&'static str> {
    match (quiet, verbose) {
        (true, _) => Some("error"),
        (false, 0) => None,
        (false, 1) => Some("debug"),
        (false, _) => Some("trace"),
    }
}

/// Install the global subscriber.
///
/// Returns the file writer's guard when a log file is configured; keep it
/// alive until exit so buffered lines are flushed.
pub fn init_observability(
    config: &ObservabilityConfig,
    filter: EnvFilter,
) -> anyhow::Result<Option<WorkerGuard>> {
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(config.console_level);

    let (file_layer, guard) = match config.file {
        Some(ref target) => {
            let appender = file_appender(target)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    Ok(guard)
}

fn file_appender(target: &LogFile) -> anyhow::Result<tracing_appender::rolling::RollingFileAppender> {
    match target {
        LogFile::Dir(dir) => {
            ensure_dir(dir)?;
            Ok(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX))
        }
        LogFile::Path(path) => {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            ensure_dir(dir)?;
            let name = path
                .file_name()
                .with_context(|| format!("log path has no file name: {}", path.display()))?;
            Ok(tracing_appender::rolling::never(dir, name))
        }
    }
}

fn ensure_dir(dir: &Path) -> anyhow::Result<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))
}
