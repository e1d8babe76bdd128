//! Logging setup for the container binary.
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `SERVLET_LOG` | `EnvFilter` directives, e.g. `info,servlet_engine::locator=debug` | `info` |
//! | `SERVLET_LOG_FORMAT` | `json` or `pretty` | `json` |
//! | `SERVLET_LOG_ASYNC` | write through a `tracing-appender` worker thread | `true` |
//! | `SERVLET_LOG_INCLUDE_LOCATION` | add file and line to each record | `false` |
//!
//! `RUST_LOG`, when set, replaces `SERVLET_LOG`.

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub filter: String,
    pub format: LogFormat,
    pub async_logging: bool,
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Json,
            async_logging: true,
            include_location: false,
        }
    }
}

impl LogConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source; unparsable values keep
    /// their defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let flag = |name: &str, default: bool| {
            lookup(name)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };
        Self {
            filter: lookup("RUST_LOG")
                .or_else(|| lookup("SERVLET_LOG"))
                .unwrap_or(defaults.filter),
            format: match lookup("SERVLET_LOG_FORMAT").as_deref().map(str::trim) {
                Some(f) if f.eq_ignore_ascii_case("pretty") => LogFormat::Pretty,
                _ => LogFormat::Json,
            },
            async_logging: flag("SERVLET_LOG_ASYNC", defaults.async_logging),
            include_location: flag("SERVLET_LOG_INCLUDE_LOCATION", defaults.include_location),
        }
    }
}

/// Holds the background writer; dropping it flushes pending records.
#[must_use = "dropping the guard stops asynchronous log output"]
pub struct LoggingGuard {
    _worker: Option<WorkerGuard>,
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails on an invalid filter directive or if a global subscriber is
/// already installed.
pub fn init_logging_with_config(config: &LogConfig) -> Result<LoggingGuard> {
    let filter = EnvFilter::try_new(&config.filter)
        .with_context(|| format!("Invalid log filter '{}'", config.filter))?;

    let (writer, worker) = if config.async_logging {
        let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());
        (BoxMakeWriter::new(non_blocking), Some(guard))
    } else {
        (BoxMakeWriter::new(std::io::stdout), None)
    };

    let output = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(output)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(LoggingGuard { _worker: worker })
}
