use crate::env::get_env;
use crate::error::{ApiError, Result};
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

/// Directory holding the database file and the log files
pub const EDUCENTERS_HOME: &str = "EDUCENTERS_HOME";
/// Path of the SQLite database file
pub const EDUCENTERS_DATABASE_PATH: &str = "EDUCENTERS_DATABASE_PATH";

/// Name of the database file when no specific path is configured
pub const DEFAULT_DATABASE_FILE_NAME: &str = "database.sqlite3";

/// Maximum number of pooled connections to a database file
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Configuration for the database.
/// The database is a SQLite database, either stored in a file or kept in memory
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatabaseConfiguration {
    /// Configuration for a SQLite database stored on disk
    SqlitePersistent {
        /// Database file path
        path: PathBuf,
    },
    /// Configuration for a SQLite database living in memory.
    /// This is mostly used for tests
    SqliteInMemory,
}

impl DatabaseConfiguration {
    /// Create a database configuration from environment variables.
    ///
    ///  - EDUCENTERS_DATABASE_PATH is used if it is set
    ///  - otherwise the database is stored in $EDUCENTERS_HOME/database.sqlite3
    ///  - EDUCENTERS_HOME defaults to ~/.educenters
    pub fn from_env() -> Result<DatabaseConfiguration> {
        if let Some(path) = get_env::<PathBuf>(EDUCENTERS_DATABASE_PATH)? {
            return Ok(Self::sqlite(&path));
        }
        Ok(Self::sqlite(&home_directory()?.join(DEFAULT_DATABASE_FILE_NAME)))
    }

    /// Create a local sqlite configuration
    pub fn sqlite(path: &Path) -> DatabaseConfiguration {
        DatabaseConfiguration::SqlitePersistent {
            path: path.to_path_buf(),
        }
    }

    /// Create an in-memory sqlite configuration
    pub fn sqlite_in_memory() -> DatabaseConfiguration {
        DatabaseConfiguration::SqliteInMemory
    }

    /// Return the maximum size of the connection pool.
    ///
    /// An in-memory SQLite database only exists for the connection which created it,
    /// so the pool for such a database must hold a single connection.
    pub fn max_connections(&self) -> u32 {
        match self {
            DatabaseConfiguration::SqlitePersistent { .. } => DEFAULT_MAX_CONNECTIONS,
            DatabaseConfiguration::SqliteInMemory => 1,
        }
    }

    /// Return the connection string used by sqlx
    pub fn connection_string(&self) -> String {
        match self {
            DatabaseConfiguration::SqliteInMemory => "sqlite::memory:".to_string(),
            DatabaseConfiguration::SqlitePersistent { path } => {
                format!("sqlite://{}?mode=rwc", path.to_string_lossy())
            }
        }
    }

    /// Create a directory for the SQLite database file if necessary
    pub fn create_directory_if_necessary(&self) -> Result<()> {
        if let DatabaseConfiguration::SqlitePersistent { path } = self {
            if let Some(parent) = path.parent() {
                if !parent.exists() {
                    create_dir_all(parent)?
                }
            }
        }
        Ok(())
    }

    /// Return true if the path for a SQLite database exists
    pub fn exists(&self) -> bool {
        self.path().map(|p| p.exists()).unwrap_or(false)
    }

    /// Return the database path if the database is a SQLite file.
    pub fn path(&self) -> Option<PathBuf> {
        match self {
            DatabaseConfiguration::SqlitePersistent { path } => Some(path.clone()),
            DatabaseConfiguration::SqliteInMemory => None,
        }
    }
}

/// Return the directory used to store the application data
pub fn home_directory() -> Result<PathBuf> {
    if let Some(home) = get_env::<PathBuf>(EDUCENTERS_HOME)? {
        return Ok(home);
    }
    home::home_dir()
        .map(|h| h.join(".educenters"))
        .ok_or_else(|| ApiError::message("the home directory cannot be determined"))
}
