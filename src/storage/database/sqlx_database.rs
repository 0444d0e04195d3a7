use core::fmt::{Debug, Formatter};
use core::str::FromStr;
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use sqlx::migrate::Migrator;
use sqlx::pool::{PoolConnection, PoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{query, Sqlite, SqliteConnection, SqlitePool};
use tokio_retry::strategy::{jitter, FixedInterval};
use tokio_retry::Retry;

use crate::error::{ApiError, Result, StorageError};
use crate::storage::database::DatabaseConfiguration;

/// Schema of the database, embedded at compile time
pub static MIGRATOR: Migrator = sqlx::migrate!("./src/storage/database/migrations/sql");

/// Time spent by SQLite waiting for a lock held by another connection before returning an error
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// The SqlxDatabase struct is used to create a database:
///   - at a given path
///   - or in memory
///
/// with the application schema applied.
///
/// We use sqlx as our primary interface for interacting with the database
/// The database driver is Sqlite
#[derive(Clone)]
pub struct SqlxDatabase {
    /// Pool of connections to the database
    pub pool: Arc<SqlitePool>,
    configuration: DatabaseConfiguration,
}

impl Debug for SqlxDatabase {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(format!("database options {:?}", self.pool.connect_options()).as_str())
    }
}

impl Deref for SqlxDatabase {
    type Target = SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.pool
    }
}

impl SqlxDatabase {
    /// Constructor for a database with the application schema
    pub async fn create(configuration: &DatabaseConfiguration) -> Result<Self> {
        let db = Self::create_no_migration(configuration).await?;
        db.migrate().await?;
        Ok(db)
    }

    /// Constructor for a database without migration
    pub async fn create_no_migration(configuration: &DatabaseConfiguration) -> Result<Self> {
        configuration.create_directory_if_necessary()?;

        // opening a database file might fail a few times
        // if the file is currently locked by another process starting up.
        // In that case we retry a few times, between 1 and 10 seconds.
        let retry_strategy = FixedInterval::from_millis(1000)
            .map(jitter) // add jitter to delays
            .take(10); // limit to 10 retries

        let pool = Retry::spawn(retry_strategy, || async {
            Self::create_connection_pool(configuration).await
        })
        .await?;

        debug!("opened the database {}", configuration.connection_string());
        Ok(SqlxDatabase {
            pool: Arc::new(pool),
            configuration: configuration.clone(),
        })
    }

    /// Create a database on disk
    pub async fn create_sqlite(path: impl AsRef<Path>) -> Result<Self> {
        Self::create(&DatabaseConfiguration::sqlite(path.as_ref())).await
    }

    /// Create a database in memory
    pub async fn in_memory(usage: &str) -> Result<Self> {
        debug!("create an in memory database for {usage}");
        Self::create(&DatabaseConfiguration::sqlite_in_memory()).await
    }

    /// Apply all the pending migrations
    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR
            .run(&*self.pool)
            .await
            .map_err(|e| ApiError::Storage(StorageError::Migration(e)))
    }

    /// Return the configuration used to create this database
    pub fn configuration(&self) -> &DatabaseConfiguration {
        &self.configuration
    }

    /// Start a write transaction with `BEGIN IMMEDIATE`.
    ///
    /// The write lock is taken before any statement runs so that two such transactions
    /// can never read the same state and then both write. A concurrent writer waits
    /// for the lock up to the busy timeout.
    pub async fn begin_immediate(&self) -> Result<WriteTransaction> {
        let mut connection = self.pool.acquire().await.into_core()?;
        query("BEGIN IMMEDIATE")
            .execute(&mut *connection)
            .await
            .void()?;
        Ok(WriteTransaction {
            connection: Some(connection),
        })
    }

    async fn create_connection_pool(configuration: &DatabaseConfiguration) -> Result<SqlitePool> {
        let options = SqliteConnectOptions::from_str(&configuration.connection_string())
            .into_core()?
            .busy_timeout(BUSY_TIMEOUT)
            .foreign_keys(true);

        let (options, pool_options) = match configuration {
            DatabaseConfiguration::SqlitePersistent { .. } => (
                options
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal),
                PoolOptions::<Sqlite>::new(),
            ),
            // SQLite in-memory DB get wiped if there is no connection to it.
            // The below setting tries to ensure there is always an open connection
            DatabaseConfiguration::SqliteInMemory => (
                options,
                PoolOptions::<Sqlite>::new()
                    .min_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None),
            ),
        };

        pool_options
            .max_connections(configuration.max_connections())
            .connect_with(options)
            .await
            .into_core()
    }
}

/// A transaction holding the database write lock.
///
/// The transaction must be finished with `commit` or `rollback`.
/// If it is dropped before that, it is rolled back in the background before
/// its connection goes back to the pool.
pub struct WriteTransaction {
    connection: Option<PoolConnection<Sqlite>>,
}

impl WriteTransaction {
    /// Return the connection executing this transaction
    pub fn connection(&mut self) -> Result<&mut SqliteConnection> {
        self.connection
            .as_deref_mut()
            .ok_or_else(|| ApiError::message("the transaction is already finished"))
    }

    /// Commit the transaction. If the commit fails the transaction is rolled back
    pub async fn commit(mut self) -> Result<()> {
        let mut connection = self.take_connection()?;
        match query("COMMIT").execute(&mut *connection).await.void() {
            Ok(()) => Ok(()),
            Err(e) => {
                Self::rollback_connection(&mut connection).await;
                Err(e)
            }
        }
    }

    /// Rollback the transaction
    pub async fn rollback(mut self) -> Result<()> {
        let mut connection = self.take_connection()?;
        query("ROLLBACK").execute(&mut *connection).await.void()
    }

    fn take_connection(&mut self) -> Result<PoolConnection<Sqlite>> {
        self.connection
            .take()
            .ok_or_else(|| ApiError::message("the transaction is already finished"))
    }

    async fn rollback_connection(connection: &mut SqliteConnection) {
        if let Err(e) = query("ROLLBACK").execute(connection).await {
            // there might be nothing left to roll back if SQLite already aborted the transaction
            debug!("rollback failed: {e}");
        }
    }
}

impl Drop for WriteTransaction {
    fn drop(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        Self::rollback_connection(&mut connection).await;
                    });
                }
                // closing the connection discards the transaction
                Err(_) => drop(connection.detach()),
            }
        }
    }
}

/// This trait provides some syntax for transforming sqlx errors into API errors
pub trait FromSqlxError<T> {
    /// Make an API error, unique constraint violations are kept apart from other errors
    fn into_core(self) -> Result<T>;
}

impl<T> FromSqlxError<T> for core::result::Result<T, sqlx::error::Error> {
    #[track_caller]
    fn into_core(self) -> Result<T> {
        self.map_err(|err| {
            let unique_violation = err
                .as_database_error()
                .filter(|e| e.is_unique_violation())
                .map(|e| e.message().to_string());
            match unique_violation {
                Some(message) => ApiError::Storage(StorageError::ConstraintViolation(message)),
                None => ApiError::Storage(StorageError::Database(err)),
            }
        })
    }
}

/// This trait provides some syntax to shorten queries execution returning ()
pub trait ToVoid<T> {
    /// Return a () value
    fn void(self) -> Result<()>;
}

impl<T> ToVoid<T> for core::result::Result<T, sqlx::error::Error> {
    #[track_caller]
    fn void(self) -> Result<()> {
        self.map(|_| ()).into_core()
    }
}

#[cfg(test)]
mod tests {
    use sqlx::sqlite::SqliteRow;
    use sqlx::Row;
    use tempfile::NamedTempFile;

    use super::*;

    /// This is a sanity check to test that the database can be created with a file path
    /// and that migrations are running ok, at least for one table
    #[tokio::test]
    async fn test_create_role_table() -> Result<()> {
        let db_file = NamedTempFile::new()?;
        let db = SqlxDatabase::create_sqlite(db_file.path()).await?;

        let inserted = query("INSERT INTO role (name) VALUES (?)")
            .bind("edu_owner")
            .execute(&*db.pool)
            .await
            .into_core()?;

        assert_eq!(inserted.rows_affected(), 1);
        Ok(())
    }

    /// A unique constraint violation is reported as such, other errors are not
    #[tokio::test]
    async fn test_error_classification() -> Result<()> {
        let db = SqlxDatabase::in_memory("errors").await?;
        let insert = || query("INSERT INTO role (name) VALUES (?)").bind("edu_owner");

        insert().execute(&*db.pool).await.void()?;
        let duplicate = insert().execute(&*db.pool).await.void();
        assert!(duplicate.unwrap_err().is_constraint_violation());

        let missing_table = query("SELECT * FROM unknown").execute(&*db.pool).await.void();
        let error = missing_table.unwrap_err();
        assert!(!error.is_constraint_violation());
        assert!(matches!(error, ApiError::Storage(StorageError::Database(_))));
        Ok(())
    }

    /// A rolled back write transaction leaves no trace, a committed one does
    #[tokio::test]
    async fn test_write_transaction() -> Result<()> {
        let db = SqlxDatabase::in_memory("transactions").await?;

        let mut transaction = db.begin_immediate().await?;
        query("INSERT INTO role (name) VALUES ('discarded')")
            .execute(transaction.connection()?)
            .await
            .void()?;
        transaction.rollback().await?;

        let mut transaction = db.begin_immediate().await?;
        query("INSERT INTO role (name) VALUES ('kept')")
            .execute(transaction.connection()?)
            .await
            .void()?;
        transaction.commit().await?;

        let rows: Vec<SqliteRow> = query("SELECT name FROM role")
            .fetch_all(&*db.pool)
            .await
            .into_core()?;
        let names: Vec<String> = rows.iter().map(|r| r.get(0)).collect();
        assert_eq!(names, vec!["kept".to_string()]);
        Ok(())
    }
}
