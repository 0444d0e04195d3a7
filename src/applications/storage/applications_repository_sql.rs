use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::*;

use crate::applications::{
    Application, ApplicationId, ApplicationIndex, ApplicationIndexStore, ApplicationsRepository,
    IndexAllocation, PendingApplication,
};
use crate::error::{ApiError, Result, StorageError};
use crate::storage::database::{FromSqlxError, SqlxDatabase, ToVoid, WriteTransaction};
use crate::users::UserId;

/// Name of the column holding the application index, used to recognize index conflicts
const INDEX_COLUMN: &str = "application.app_index";

#[derive(Clone)]
pub struct ApplicationsSqlxDatabase {
    database: SqlxDatabase,
}

impl ApplicationsSqlxDatabase {
    pub fn new(database: SqlxDatabase) -> Self {
        debug!("create a repository for applications");
        Self { database }
    }

    /// Create a new in-memory database
    pub async fn create() -> Result<Self> {
        Ok(Self::new(SqlxDatabase::in_memory("applications").await?))
    }
}

#[async_trait]
impl ApplicationIndexStore for ApplicationsSqlxDatabase {
    async fn begin_allocation(&self) -> Result<Box<dyn IndexAllocation>> {
        let transaction = self.database.begin_immediate().await?;
        Ok(Box::new(SqlxIndexAllocation { transaction }))
    }
}

#[async_trait]
impl ApplicationsRepository for ApplicationsSqlxDatabase {
    async fn get_application(&self, id: ApplicationId) -> Result<Option<Application>> {
        let query = query_as("SELECT id, owner_id, center_id, course_id, app_index, content, created_at FROM application WHERE id = ? AND app_index IS NOT NULL").bind(id);
        let row: Option<ApplicationRow> = query
            .fetch_optional(&*self.database.pool)
            .await
            .into_core()?;
        row.map(|r| r.application()).transpose()
    }

    async fn get_application_by_index(
        &self,
        index: ApplicationIndex,
    ) -> Result<Option<Application>> {
        let query = query_as("SELECT id, owner_id, center_id, course_id, app_index, content, created_at FROM application WHERE app_index = ?").bind(index.to_sql());
        let row: Option<ApplicationRow> = query
            .fetch_optional(&*self.database.pool)
            .await
            .into_core()?;
        row.map(|r| r.application()).transpose()
    }

    async fn get_applications(&self) -> Result<Vec<Application>> {
        let query = query_as("SELECT id, owner_id, center_id, course_id, app_index, content, created_at FROM application WHERE app_index IS NOT NULL ORDER BY app_index");
        let rows: Vec<ApplicationRow> = query.fetch_all(&*self.database.pool).await.into_core()?;
        rows.iter().map(|r| r.application()).collect()
    }

    async fn get_applications_by_owner(&self, owner_id: UserId) -> Result<Vec<Application>> {
        let query = query_as("SELECT id, owner_id, center_id, course_id, app_index, content, created_at FROM application WHERE owner_id = ? AND app_index IS NOT NULL ORDER BY app_index").bind(owner_id);
        let rows: Vec<ApplicationRow> = query.fetch_all(&*self.database.pool).await.into_core()?;
        rows.iter().map(|r| r.application()).collect()
    }

    async fn get_unindexed_applications(&self) -> Result<Vec<ApplicationId>> {
        let query = query("SELECT id FROM application WHERE app_index IS NULL ORDER BY id");
        let rows: Vec<SqliteRow> = query.fetch_all(&*self.database.pool).await.into_core()?;
        Ok(rows.iter().map(|r| r.get(0)).collect())
    }

    async fn update_without_reallocation(&self, application: &Application) -> Result<()> {
        let query = query(
            "UPDATE application SET center_id = ?, course_id = ?, content = ? WHERE id = ? AND app_index IS NOT NULL",
        )
        .bind(application.center_id())
        .bind(application.course_id())
        .bind(application.content())
        .bind(application.id());
        let result = query.execute(&*self.database.pool).await.into_core()?;
        if result.rows_affected() == 0 {
            return Err(ApiError::not_found(format!(
                "application {}",
                application.id()
            )));
        }
        Ok(())
    }

    async fn delete_application(&self, id: ApplicationId) -> Result<()> {
        let query = query("DELETE FROM application WHERE id = ?").bind(id);
        query.execute(&*self.database.pool).await.void()
    }
}

/// Allocation transaction started with `BEGIN IMMEDIATE`
struct SqlxIndexAllocation {
    transaction: WriteTransaction,
}

#[async_trait]
impl IndexAllocation for SqlxIndexAllocation {
    async fn max_index(&mut self) -> Result<Option<ApplicationIndex>> {
        let query = query("SELECT MAX(app_index) FROM application");
        let row: SqliteRow = query
            .fetch_one(self.transaction.connection()?)
            .await
            .into_core()?;
        let max_index: Option<i64> = row.try_get(0).into_core()?;
        max_index.map(ApplicationIndex::from_sql).transpose()
    }

    async fn commit_with_unique_constraint(
        self: Box<Self>,
        pending: &PendingApplication,
        index: ApplicationIndex,
    ) -> Result<Application> {
        let mut transaction = self.transaction;
        match Self::write(&mut transaction, pending, index).await {
            Ok(application) => {
                transaction.commit().await?;
                Ok(application)
            }
            Err(e) => {
                if let Err(rollback_error) = transaction.rollback().await {
                    debug!("the allocation of index {index} could not be rolled back: {rollback_error}");
                }
                Err(e)
            }
        }
    }
}

impl SqlxIndexAllocation {
    async fn write(
        transaction: &mut WriteTransaction,
        pending: &PendingApplication,
        index: ApplicationIndex,
    ) -> Result<Application> {
        match pending {
            PendingApplication::New(application) => {
                let created_at = Utc::now();
                let query = query(
                    "INSERT INTO application (owner_id, center_id, course_id, app_index, content, created_at) VALUES (?, ?, ?, ?, ?, ?)",
                )
                .bind(application.owner_id())
                .bind(application.center_id())
                .bind(application.course_id())
                .bind(index.to_sql())
                .bind(application.content())
                .bind(created_at.to_rfc3339());
                let result = query
                    .execute(transaction.connection()?)
                    .await
                    .into_core()
                    .map_err(Self::index_conflict_only)?;
                Ok(Application::new(
                    result.last_insert_rowid(),
                    application.owner_id(),
                    application.center_id(),
                    application.course_id(),
                    index,
                    application.content(),
                    created_at,
                ))
            }
            PendingApplication::Unindexed(id) => {
                let query =
                    query("UPDATE application SET app_index = ? WHERE id = ? AND app_index IS NULL")
                        .bind(index.to_sql())
                        .bind(*id);
                let result = query
                    .execute(transaction.connection()?)
                    .await
                    .into_core()
                    .map_err(Self::index_conflict_only)?;
                if result.rows_affected() == 0 {
                    return Err(ApiError::not_found(format!("unindexed application {id}")));
                }

                let query = query_as("SELECT id, owner_id, center_id, course_id, app_index, content, created_at FROM application WHERE id = ?").bind(*id);
                let row: ApplicationRow = query
                    .fetch_one(transaction.connection()?)
                    .await
                    .into_core()?;
                row.application()
            }
        }
    }

    /// Only a violation of the index uniqueness can be resolved by allocating another index
    fn index_conflict_only(error: ApiError) -> ApiError {
        match error {
            ApiError::Storage(StorageError::ConstraintViolation(message))
                if !message.contains(INDEX_COLUMN) =>
            {
                ApiError::message(format!("unexpected constraint violation: {message}"))
            }
            other => other,
        }
    }
}

// Database serialization / deserialization

#[derive(FromRow)]
struct ApplicationRow {
    id: i64,
    owner_id: i64,
    center_id: i64,
    course_id: i64,
    app_index: Option<i64>,
    content: String,
    created_at: String,
}

impl ApplicationRow {
    fn application(&self) -> Result<Application> {
        let index = self
            .app_index
            .ok_or_else(|| StorageError::decode("app_index", "the application has no index"))?;
        Ok(Application::new(
            self.id,
            self.owner_id,
            self.center_id,
            self.course_id,
            ApplicationIndex::from_sql(index)?,
            self.content.clone(),
            self.created_at()?,
        ))
    }

    fn created_at(&self) -> Result<DateTime<Utc>> {
        Ok(DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| StorageError::decode("created_at", e))?
            .into())
    }
}
