use async_trait::async_trait;

use crate::educenters::{CourseId, Educenter, EducenterId, EducenterSummary, NewEducenter};
use crate::error::Result;

/// This trait supports the storage of education centers:
///
///  - a center has a unique slug, derived from its name when not given
///  - a center teaches a list of courses
///
#[async_trait]
pub trait EducentersRepository: Send + Sync + 'static {
    /// Store a new center, without any course
    async fn store_educenter(&self, center: NewEducenter) -> Result<Educenter>;

    /// Get a center by id, with its courses
    async fn get_educenter(&self, id: EducenterId) -> Result<Option<Educenter>>;

    /// Get a center by slug, with its courses
    async fn get_educenter_by_slug(&self, slug: &str) -> Result<Option<Educenter>>;

    /// Get the name and slug of all the centers
    async fn get_educenters(&self) -> Result<Vec<EducenterSummary>>;

    /// Update the details and the courses of a center in one transaction.
    /// The slug is not changed
    async fn update_educenter(&self, center: &Educenter) -> Result<()>;

    /// Replace the list of courses taught by a center
    async fn set_educenter_courses(
        &self,
        center_id: EducenterId,
        course_ids: &[CourseId],
    ) -> Result<()>;

    /// Delete a center and its links to courses
    async fn delete_educenter(&self, id: EducenterId) -> Result<()>;
}
