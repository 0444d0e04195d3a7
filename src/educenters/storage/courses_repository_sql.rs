use async_trait::async_trait;
use sqlx::*;

use crate::educenters::models::{check_length, slug_for};
use crate::educenters::{
    Course, CourseId, CoursesRepository, MAX_SLUG_LENGTH, MAX_NAME_LENGTH,
};
use crate::error::Result;
use crate::storage::database::{FromSqlxError, SqlxDatabase, ToVoid};

#[derive(Clone)]
pub struct CoursesSqlxDatabase {
    database: SqlxDatabase,
}

impl CoursesSqlxDatabase {
    pub fn new(database: SqlxDatabase) -> Self {
        debug!("create a repository for courses");
        Self { database }
    }

    /// Create a new in-memory database
    pub async fn create() -> Result<Self> {
        Ok(Self::new(SqlxDatabase::in_memory("courses").await?))
    }
}

#[async_trait]
impl CoursesRepository for CoursesSqlxDatabase {
    async fn store_course(&self, title: &str, slug: Option<&str>) -> Result<Course> {
        let slug = match slug {
            Some(slug) => slug.to_string(),
            None => slug_for(title)?,
        };
        check_length("title", title, MAX_NAME_LENGTH)?;
        check_length("slug", &slug, MAX_SLUG_LENGTH)?;

        let query = query("INSERT INTO course (title, slug) VALUES (?, ?)")
            .bind(title)
            .bind(&slug);
        let result = query.execute(&*self.database.pool).await.into_core()?;
        Ok(Course::new(result.last_insert_rowid(), title, slug))
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>> {
        let query = query_as("SELECT id, title, slug FROM course WHERE id = ?").bind(id);
        let row: Option<CourseRow> = query
            .fetch_optional(&*self.database.pool)
            .await
            .into_core()?;
        Ok(row.map(|r| r.course()))
    }

    async fn get_course_by_slug(&self, slug: &str) -> Result<Option<Course>> {
        let query = query_as("SELECT id, title, slug FROM course WHERE slug = ?").bind(slug);
        let row: Option<CourseRow> = query
            .fetch_optional(&*self.database.pool)
            .await
            .into_core()?;
        Ok(row.map(|r| r.course()))
    }

    async fn get_courses(&self) -> Result<Vec<Course>> {
        let query = query_as("SELECT id, title, slug FROM course ORDER BY title, id");
        let rows: Vec<CourseRow> = query.fetch_all(&*self.database.pool).await.into_core()?;
        Ok(rows.iter().map(|r| r.course()).collect())
    }

    async fn delete_course(&self, id: CourseId) -> Result<()> {
        let query = query("DELETE FROM course WHERE id = ?").bind(id);
        query.execute(&*self.database.pool).await.void()
    }
}

// Database serialization / deserialization

#[derive(FromRow)]
pub(crate) struct CourseRow {
    id: i64,
    title: String,
    slug: Option<String>,
}

impl CourseRow {
    pub(crate) fn course(&self) -> Course {
        Course::new(
            self.id,
            self.title.clone(),
            self.slug.clone().unwrap_or_default(),
        )
    }
}
