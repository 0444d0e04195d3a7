use tracing_core::Level;

use crate::logs::LogFormat;

pub(crate) const DEFAULT_LOG_LEVEL: Level = Level::INFO;

/// Log format for files. See LogFormat for other values
pub(crate) const DEFAULT_LOG_FORMAT: LogFormat = LogFormat::Default;

/// Maximum number of daily log files
pub(crate) const DEFAULT_LOG_MAX_FILES: u64 = 60;

pub(crate) const DEFAULT_LOGGING_COLOR: bool = true;

/// Crates logging by default
pub(crate) const DEFAULT_LOG_CRATES: &[&str] = &["educenters_api"];

/// Prefix and suffix of the log file names
pub(crate) const LOG_FILE_PREFIX: &str = "educenters";
pub(crate) const LOG_FILE_SUFFIX: &str = "log";
