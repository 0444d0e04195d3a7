use async_trait::async_trait;
use sqlx::*;

use crate::educenters::models::check_length;
use crate::educenters::storage::courses_repository_sql::CourseRow;
use crate::educenters::{
    Course, CourseId, Educenter, EducenterId, EducenterSummary, EducentersRepository,
    NewEducenter, MAX_SLUG_LENGTH,
};
use crate::error::{ApiError, Result};
use crate::storage::database::{FromSqlxError, SqlxDatabase, ToVoid};

#[derive(Clone)]
pub struct EducentersSqlxDatabase {
    database: SqlxDatabase,
}

impl EducentersSqlxDatabase {
    pub fn new(database: SqlxDatabase) -> Self {
        debug!("create a repository for education centers");
        Self { database }
    }

    /// Create a new in-memory database
    pub async fn create() -> Result<Self> {
        Ok(Self::new(SqlxDatabase::in_memory("educenters").await?))
    }

    async fn get_courses_of(&self, center_id: EducenterId) -> Result<Vec<Course>> {
        let query = query_as(
            "SELECT c.id, c.title, c.slug FROM course c \
             JOIN educenter_course ec ON ec.course_id = c.id \
             WHERE ec.educenter_id = ? ORDER BY c.title, c.id",
        )
        .bind(center_id);
        let rows: Vec<CourseRow> = query.fetch_all(&*self.database.pool).await.into_core()?;
        Ok(rows.iter().map(|r| r.course()).collect())
    }

    async fn with_courses(&self, row: Option<EducenterRow>) -> Result<Option<Educenter>> {
        match row {
            Some(row) => {
                let courses = self.get_courses_of(row.id).await?;
                Ok(Some(row.educenter().with_courses(courses)))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl EducentersRepository for EducentersSqlxDatabase {
    async fn store_educenter(&self, center: NewEducenter) -> Result<Educenter> {
        center.validate()?;
        let slug = center.slug()?;
        check_length("slug", &slug, MAX_SLUG_LENGTH)?;
        let query = query(
            "INSERT INTO educenter (name, slug, bio, phone_number, phone_number_extra) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(center.name())
        .bind(&slug)
        .bind(center.bio())
        .bind(center.phone_number())
        .bind(center.phone_number_extra());
        let result = query.execute(&*self.database.pool).await.into_core()?;
        Ok(Educenter::new(result.last_insert_rowid(), slug, center))
    }

    async fn get_educenter(&self, id: EducenterId) -> Result<Option<Educenter>> {
        let query = query_as("SELECT id, name, slug, bio, phone_number, phone_number_extra FROM educenter WHERE id = ?").bind(id);
        let row: Option<EducenterRow> = query
            .fetch_optional(&*self.database.pool)
            .await
            .into_core()?;
        self.with_courses(row).await
    }

    async fn get_educenter_by_slug(&self, slug: &str) -> Result<Option<Educenter>> {
        let query = query_as("SELECT id, name, slug, bio, phone_number, phone_number_extra FROM educenter WHERE slug = ?").bind(slug);
        let row: Option<EducenterRow> = query
            .fetch_optional(&*self.database.pool)
            .await
            .into_core()?;
        self.with_courses(row).await
    }

    async fn get_educenters(&self) -> Result<Vec<EducenterSummary>> {
        let query = query_as("SELECT id, name, slug, bio, phone_number, phone_number_extra FROM educenter ORDER BY name, id");
        let rows: Vec<EducenterRow> = query.fetch_all(&*self.database.pool).await.into_core()?;
        Ok(rows.iter().map(|r| r.educenter().summary()).collect())
    }

    async fn update_educenter(&self, center: &Educenter) -> Result<()> {
        center.validate()?;
        let course_ids: Vec<CourseId> = center.courses().iter().map(|c| c.id()).collect();
        let mut transaction = self.database.begin().await.into_core()?;
        update_details(&mut transaction, center).await?;
        replace_courses(&mut transaction, center.id(), &course_ids).await?;
        transaction.commit().await.void()
    }

    async fn set_educenter_courses(
        &self,
        center_id: EducenterId,
        course_ids: &[CourseId],
    ) -> Result<()> {
        let mut transaction = self.database.begin().await.into_core()?;

        let exists: Option<(i64,)> = query_as("SELECT id FROM educenter WHERE id = ?")
            .bind(center_id)
            .fetch_optional(&mut *transaction)
            .await
            .into_core()?;
        if exists.is_none() {
            return Err(ApiError::not_found(format!("center {center_id}")));
        }

        replace_courses(&mut transaction, center_id, course_ids).await?;
        transaction.commit().await.void()
    }

    async fn delete_educenter(&self, id: EducenterId) -> Result<()> {
        let query = query("DELETE FROM educenter WHERE id = ?").bind(id);
        query.execute(&*self.database.pool).await.void()
    }
}

/// Write the details of a center, the transaction is left open
async fn update_details(connection: &mut SqliteConnection, center: &Educenter) -> Result<()> {
    let query = query(
        "UPDATE educenter SET name = ?, bio = ?, phone_number = ?, phone_number_extra = ? WHERE id = ?",
    )
    .bind(center.name())
    .bind(center.bio())
    .bind(center.phone_number())
    .bind(center.phone_number_extra())
    .bind(center.id());
    let result = query.execute(&mut *connection).await.into_core()?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found(format!("center {}", center.slug())));
    }
    Ok(())
}

async fn replace_courses(
    connection: &mut SqliteConnection,
    center_id: EducenterId,
    course_ids: &[CourseId],
) -> Result<()> {
    query("DELETE FROM educenter_course WHERE educenter_id = ?")
        .bind(center_id)
        .execute(&mut *connection)
        .await
        .void()?;

    for course_id in course_ids {
        let query = query(
            "INSERT OR IGNORE INTO educenter_course (educenter_id, course_id) VALUES (?, ?)",
        )
        .bind(center_id)
        .bind(*course_id);
        query.execute(&mut *connection).await.void()?;
    }
    Ok(())
}

// Database serialization / deserialization

#[derive(FromRow)]
struct EducenterRow {
    id: i64,
    name: String,
    slug: Option<String>,
    bio: Option<String>,
    phone_number: Option<String>,
    phone_number_extra: Option<String>,
}

impl EducenterRow {
    fn educenter(&self) -> Educenter {
        let details = NewEducenter::from_columns(
            self.name.clone(),
            self.bio.clone(),
            self.phone_number.clone(),
            self.phone_number_extra.clone(),
        );
        Educenter::new(self.id, self.slug.clone().unwrap_or_default(), details)
    }
}
