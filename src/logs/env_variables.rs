/// Log level: error, warn, info, debug or trace
pub const EDUCENTERS_LOG_LEVEL: &str = "EDUCENTERS_LOG_LEVEL";
/// Log format: default, pretty or json
pub const EDUCENTERS_LOG_FORMAT: &str = "EDUCENTERS_LOG_FORMAT";
/// Directory for the log files. Log messages go to stdout when it is not set
pub const EDUCENTERS_LOG_DIR: &str = "EDUCENTERS_LOG_DIR";
/// Maximum number of rotated log files kept in the log directory
pub const EDUCENTERS_LOG_MAX_FILES: &str = "EDUCENTERS_LOG_MAX_FILES";
/// Colored log output on stdout
pub const EDUCENTERS_LOGGING_COLOR: &str = "EDUCENTERS_LOGGING_COLOR";
/// Comma-separated list of crates to keep log messages for, or "all"
pub const EDUCENTERS_LOG_CRATES_FILTER: &str = "EDUCENTERS_LOG_CRATES_FILTER";
