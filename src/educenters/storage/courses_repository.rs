use async_trait::async_trait;

use crate::educenters::{Course, CourseId};
use crate::error::Result;

/// This trait supports the storage of courses.
///
/// A course is identified by its slug. When no slug is given it is derived from the title.
#[async_trait]
pub trait CoursesRepository: Send + Sync + 'static {
    /// Store a new course
    async fn store_course(&self, title: &str, slug: Option<&str>) -> Result<Course>;

    /// Get a course by id
    async fn get_course(&self, id: CourseId) -> Result<Option<Course>>;

    /// Get a course by slug
    async fn get_course_by_slug(&self, slug: &str) -> Result<Option<Course>>;

    /// Get all the courses, ordered by title
    async fn get_courses(&self) -> Result<Vec<Course>>;

    /// Delete a course, it is also removed from the centers teaching it
    async fn delete_course(&self, id: CourseId) -> Result<()>;
}
