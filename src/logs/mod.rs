use std::io::stdout;

pub use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::env::FromString;
use crate::error::{ApiError, Result};
use crate::logs::default_values::{LOG_FILE_PREFIX, LOG_FILE_SUFFIX};
pub use logging_configuration::*;

mod default_values;
pub mod env_variables;
mod logging_configuration;

pub struct Logging;

impl Logging {
    /// Install a global subscriber writing log messages either to stdout or to daily log files.
    /// The returned guard must be kept alive for as long as messages are logged
    pub fn setup(configuration: &LoggingConfiguration) -> Result<LoggingGuard> {
        let subscriber = tracing_subscriber::registry()
            .with(configuration.env_filter())
            .with(tracing_error::ErrorLayer::default());

        let (writer, guard) = match configuration.log_dir() {
            // If a log directory is not provided, log to stdout.
            None => tracing_appender::non_blocking(stdout()),
            // If a log directory is provided, log to a rolling file appender.
            Some(log_dir) => {
                let appender = RollingFileAppender::builder()
                    .rotation(Rotation::DAILY)
                    .max_log_files(configuration.max_files() as usize)
                    .filename_prefix(LOG_FILE_PREFIX)
                    .filename_suffix(LOG_FILE_SUFFIX)
                    .build(log_dir)
                    .map_err(|e| {
                        ApiError::message(format!("cannot create the log files appender: {e}"))
                    })?;
                tracing_appender::non_blocking(appender)
            }
        };
        let colored = configuration.is_colored() && configuration.log_dir().is_none();
        let appender = layer().with_ansi(colored).with_writer(writer);

        let result = match configuration.format() {
            LogFormat::Pretty => subscriber.with(appender.pretty()).try_init(),
            LogFormat::Json => subscriber.with(appender.json()).try_init(),
            LogFormat::Default => subscriber.with(appender).try_init(),
        };
        result.map_err(|e| ApiError::message(format!("cannot initialize the logs: {e}")))?;

        info!("logging initialized {configuration}");
        Ok(LoggingGuard {
            _worker_guard: guard,
        })
    }
}

/// Keeps the background writer running. Buffered log messages are flushed when it is dropped
#[derive(Debug)]
pub struct LoggingGuard {
    _worker_guard: WorkerGuard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Default,
    Pretty,
    Json,
}

impl FromString for LogFormat {
    fn from_string(s: &str) -> Result<Self> {
        match s {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Ok(LogFormat::Default),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            LogFormat::Default => write!(f, "default"),
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}
