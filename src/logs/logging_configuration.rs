use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use tracing_core::Level;
use tracing_subscriber::EnvFilter;

use crate::env::{get_env, get_env_with_default, FromString};
use crate::error::Result;
use crate::logs::default_values::*;
use crate::logs::env_variables::*;
use crate::logs::LogFormat;

/// List of all the configuration parameters relevant for configuring the logs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfiguration {
    /// Verbosity required for a given log record
    level: Level,
    /// Maximum number of log files kept in the log directory
    max_files: u64,
    /// Format used for log lines: pretty, json, default
    format: LogFormat,
    /// Colored output, only used when logging to stdout
    colored: bool,
    /// Directory where log files must be created.
    /// If no directory is defined then log messages appear on stdout
    log_dir: Option<PathBuf>,
    /// List of crates for which we want to keep log messages, None for all crates
    crates: Option<Vec<String>>,
}

impl Default for LoggingConfiguration {
    fn default() -> Self {
        LoggingConfiguration {
            level: DEFAULT_LOG_LEVEL,
            max_files: DEFAULT_LOG_MAX_FILES,
            format: DEFAULT_LOG_FORMAT,
            colored: DEFAULT_LOGGING_COLOR,
            log_dir: None,
            crates: CratesFilter::default().crates(),
        }
    }
}

impl LoggingConfiguration {
    /// Create the logging configuration from environment variables
    pub fn from_env() -> Result<LoggingConfiguration> {
        Ok(LoggingConfiguration {
            level: get_env_with_default(EDUCENTERS_LOG_LEVEL, DEFAULT_LOG_LEVEL)?,
            max_files: get_env_with_default(EDUCENTERS_LOG_MAX_FILES, DEFAULT_LOG_MAX_FILES)?,
            format: get_env_with_default(EDUCENTERS_LOG_FORMAT, DEFAULT_LOG_FORMAT)?,
            colored: get_env_with_default(EDUCENTERS_LOGGING_COLOR, DEFAULT_LOGGING_COLOR)?,
            log_dir: get_env(EDUCENTERS_LOG_DIR)?,
            crates: get_env_with_default(EDUCENTERS_LOG_CRATES_FILTER, CratesFilter::default())?
                .crates(),
        })
    }

    /// Return the logging level
    pub fn level(&self) -> Level {
        self.level
    }

    /// Return the maximum number of log files
    pub fn max_files(&self) -> u64 {
        self.max_files
    }

    /// Return the log format used for log lines
    pub fn format(&self) -> LogFormat {
        self.format.clone()
    }

    /// Return true if color can be used for log lines
    pub fn is_colored(&self) -> bool {
        self.colored
    }

    /// Return the (optional) directory for creating log files
    pub fn log_dir(&self) -> Option<PathBuf> {
        self.log_dir.clone()
    }

    /// Return the crates used to filter log messages
    pub fn crates(&self) -> Option<Vec<String>> {
        self.crates.clone()
    }

    /// Set a specific log directory
    pub fn set_log_directory(self, log_dir: PathBuf) -> LoggingConfiguration {
        LoggingConfiguration {
            log_dir: Some(log_dir),
            ..self
        }
    }

    /// Set some specific crates
    pub fn set_crates(self, crates: &[&str]) -> LoggingConfiguration {
        LoggingConfiguration {
            crates: Some(crates.iter().map(|c| c.to_string()).collect()),
            ..self
        }
    }

    /// Keep the log messages of all crates
    pub fn set_all_crates(self) -> LoggingConfiguration {
        LoggingConfiguration {
            crates: None,
            ..self
        }
    }

    pub fn set_log_level(self, level: Level) -> LoggingConfiguration {
        LoggingConfiguration { level, ..self }
    }

    pub fn set_format(self, format: LogFormat) -> LoggingConfiguration {
        LoggingConfiguration { format, ..self }
    }

    /// Create an EnvFilter which keeps only the log messages
    ///
    ///  - for the configured level
    ///  - for the configured crates
    pub fn env_filter(&self) -> EnvFilter {
        match &self.crates {
            Some(crates) => EnvFilter::builder()
                .with_default_directive(Level::WARN.into())
                .parse_lossy(
                    crates
                        .iter()
                        .map(|c| format!("{c}={}", self.level))
                        .collect::<Vec<_>>()
                        .join(","),
                ),
            None => EnvFilter::default().add_directive(self.level.into()),
        }
    }
}

impl Display for LoggingConfiguration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingConfiguration")
            .field("level", &self.level.to_string())
            .field("max_files", &self.max_files)
            .field("format", &self.format.to_string())
            .field("colored", &self.colored)
            .field("log_dir", &self.log_dir)
            .field("crates", &self.crates)
            .finish()
    }
}

/// Crates for which log messages are kept
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CratesFilter {
    All,
    Selected(Vec<String>),
}

impl Default for CratesFilter {
    fn default() -> Self {
        CratesFilter::Selected(DEFAULT_LOG_CRATES.iter().map(|c| c.to_string()).collect())
    }
}

impl CratesFilter {
    pub fn crates(&self) -> Option<Vec<String>> {
        match self {
            CratesFilter::All => None,
            CratesFilter::Selected(list) => Some(list.clone()),
        }
    }
}

impl FromString for CratesFilter {
    fn from_string(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(CratesFilter::All),
            other => Ok(CratesFilter::Selected(<Vec<String>>::from_string(other)?)),
        }
    }
}

impl Display for CratesFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CratesFilter::All => f.write_str("all"),
            CratesFilter::Selected(s) => f.write_str(s.join(",").as_str()),
        }
    }
}
