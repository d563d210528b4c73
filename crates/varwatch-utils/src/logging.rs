//! # Logging Utilities
//!
//! Logging infrastructure for varwatch using `tracing`.
//!
//! varwatch's stdout carries nothing but event lines, so every log record
//! goes to **stderr** (and optionally a file). The default level is `warn`,
//! which keeps a normal run silent apart from the events themselves.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use varwatch_utils::init_logging;
//!
//! // Keep the guard alive until the program exits so file logs get flushed
//! let _guard = init_logging(None).expect("Failed to initialize logging");
//!
//! tracing::warn!("Something looks off");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Log filter (e.g., `RUST_LOG=debug`, `RUST_LOG=varwatch_core=trace`)
//! - `VARWATCH_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `VARWATCH_LOG_FILE`: Optional path to an additional log file
//!
//! ## Level precedence
//!
//! 1. An explicit level (the `--log-level` flag)
//! 2. `RUST_LOG`, which may carry per-module directives
//! 3. `warn`

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, io};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format
pub const LOG_FORMAT_ENV: &str = "VARWATCH_LOG_FORMAT";
/// Environment variable naming an extra log file
pub const LOG_FILE_ENV: &str = "VARWATCH_LOG_FILE";

const DEFAULT_LEVEL: Level = Level::WARN;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat
{
    /// Human-readable lines (default)
    #[default]
    Pretty,
    /// One JSON object per record
    Json,
}

impl FromStr for LogFormat
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {s}. Use 'pretty' or 'json'")),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level (default)
    Warn,
    /// Info level
    Info,
    /// Debug level
    Debug,
    /// Trace level (most verbose)
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!(
                "Unknown log level: {s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            )),
        }
    }
}

/// Resolved logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogConfig
{
    /// Explicit level; overrides `RUST_LOG` when set
    pub level: Option<LogLevel>,
    /// Output format for stderr and the file
    pub format: LogFormat,
    /// Extra log file, if any
    pub file: Option<PathBuf>,
}

impl LogConfig
{
    /// Build a configuration from `VARWATCH_LOG_FORMAT` and `VARWATCH_LOG_FILE`.
    ///
    /// ## Errors
    ///
    /// `InvalidFormat` if `VARWATCH_LOG_FORMAT` is set to something unknown.
    pub fn from_env(level: Option<LogLevel>) -> Result<Self, LoggingError>
    {
        Self::from_values(level, env::var(LOG_FORMAT_ENV).ok(), env::var(LOG_FILE_ENV).ok())
    }

    fn from_values(level: Option<LogLevel>, format: Option<String>, file: Option<String>) -> Result<Self, LoggingError>
    {
        let format = match format.as_deref().map(str::trim) {
            None | Some("") => LogFormat::default(),
            Some(value) => value.parse().map_err(LoggingError::InvalidFormat)?,
        };
        let file = file.filter(|path| !path.is_empty()).map(PathBuf::from);
        Ok(Self { level, format, file })
    }
}

/// Build the level filter.
///
/// ## Errors
///
/// `InvalidLevel` if no explicit level is given and `rust_log` does not parse.
pub fn build_filter(explicit: Option<LogLevel>, rust_log: Option<&str>) -> Result<EnvFilter, LoggingError>
{
    match (explicit, rust_log.map(str::trim).filter(|value| !value.is_empty())) {
        (Some(level), _) => Ok(EnvFilter::new(Level::from(level).to_string())),
        (None, Some(directives)) => {
            EnvFilter::try_new(directives).map_err(|e| LoggingError::InvalidLevel(format!("RUST_LOG={directives}: {e}")))
        }
        (None, None) => Ok(EnvFilter::new(DEFAULT_LEVEL.to_string())),
    }
}

/// Keeps the background file writer alive
///
/// Dropping it flushes and stops the file writer; hold it until exit.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard
{
    _file_guard: Option<WorkerGuard>,
}

/// Initialize logging from the environment, with an optional explicit level.
///
/// ## Errors
///
/// Returns an error if:
/// - Logging is already initialized
/// - `VARWATCH_LOG_FORMAT` or `RUST_LOG` hold invalid values
pub fn init_logging(level: Option<LogLevel>) -> Result<LoggingGuard, LoggingError>
{
    init_logging_with_config(&LogConfig::from_env(level)?)
}

/// Initialize logging with an explicit configuration.
///
/// `RUST_LOG` is still consulted when `config.level` is `None`.
///
/// ## Errors
///
/// Returns an error if logging is already initialized or the filter is invalid.
pub fn init_logging_with_config(config: &LogConfig) -> Result<LoggingGuard, LoggingError>
{
    let rust_log = env::var(EnvFilter::DEFAULT_ENV).ok();

    let mut layers: Vec<BoxedLayer> = vec![stderr_layer(config.format, build_filter(config.level, rust_log.as_deref())?)];

    let mut file_guard = None;
    if let Some(path) = &config.file {
        let (layer, guard) = file_layer(path, config.format, build_filter(config.level, rust_log.as_deref())?);
        layers.push(layer);
        file_guard = Some(guard);
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|e| LoggingError::InitializationFailed(e.to_string()))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn stderr_layer(format: LogFormat, filter: EnvFilter) -> BoxedLayer
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(io::stderr().is_terminal())
            .with_writer(io::stderr)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(io::stderr)
            .with_filter(filter)
            .boxed(),
    }
}

fn file_layer(path: &Path, format: LogFormat, filter: EnvFilter) -> (BoxedLayer, WorkerGuard)
{
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let appender = tracing_appender::rolling::never(directory, path.file_name().unwrap_or_default());
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = match format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(false) // No ANSI in files
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(filter)
            .boxed(),
    };
    (layer, guard)
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    /// Invalid log level
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_log_format_from_str()
    {
        assert_eq!(LogFormat::from_str("pretty").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("json").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("dev").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("prod").unwrap(), LogFormat::Json);
        assert!(LogFormat::from_str("invalid").is_err());
    }

    #[test]
    fn test_log_level_from_str()
    {
        assert_eq!(LogLevel::from_str("error").unwrap(), LogLevel::Error);
        assert_eq!(LogLevel::from_str("warn").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("info").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str("debug").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("trace").unwrap(), LogLevel::Trace);
        assert!(LogLevel::from_str("invalid").is_err());
    }

    #[test]
    fn test_log_level_to_tracing_level()
    {
        assert_eq!(Level::from(LogLevel::Error), Level::ERROR);
        assert_eq!(Level::from(LogLevel::Warn), Level::WARN);
        assert_eq!(Level::from(LogLevel::Info), Level::INFO);
        assert_eq!(Level::from(LogLevel::Debug), Level::DEBUG);
        assert_eq!(Level::from(LogLevel::Trace), Level::TRACE);
    }

    #[test]
    fn test_config_defaults()
    {
        let config = LogConfig::from_values(None, None, None).unwrap();
        assert_eq!(config, LogConfig::default());
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.file.is_none());
    }

    #[test]
    fn test_config_from_values()
    {
        let config = LogConfig::from_values(
            Some(LogLevel::Debug),
            Some("JSON".to_string()),
            Some("/tmp/varwatch.log".to_string()),
        )
        .unwrap();
        assert_eq!(config.level, Some(LogLevel::Debug));
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.file, Some(PathBuf::from("/tmp/varwatch.log")));

        let config = LogConfig::from_values(None, Some(String::new()), Some(String::new())).unwrap();
        assert_eq!(config, LogConfig::default());
    }

    #[test]
    fn test_config_rejects_unknown_format()
    {
        let result = LogConfig::from_values(None, Some("xml".to_string()), None);
        assert!(matches!(result, Err(LoggingError::InvalidFormat(_))));
    }

    #[test]
    fn test_filter_precedence()
    {
        let explicit = build_filter(Some(LogLevel::Debug), Some("trace")).unwrap();
        assert!(explicit.to_string().to_lowercase().contains("debug"));

        let from_env = build_filter(None, Some("varwatch_core=trace")).unwrap();
        assert!(from_env.to_string().contains("varwatch_core"));

        let default = build_filter(None, None).unwrap();
        assert!(default.to_string().to_lowercase().contains("warn"));

        let blank = build_filter(None, Some("  ")).unwrap();
        assert!(blank.to_string().to_lowercase().contains("warn"));
    }

    #[test]
    fn test_filter_rejects_invalid_rust_log()
    {
        let result = build_filter(None, Some("varwatch_core=loud"));
        assert!(matches!(result, Err(LoggingError::InvalidLevel(_))));
    }
}
