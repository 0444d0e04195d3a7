use crate::edu_state::EduState;
use crate::educenters::{Course, Educenter, EducenterSummary, NewEducenter};
use crate::error::{ApiError, Result};
use crate::users::User;

impl EduState {
    /// Create a center, the user must be allowed to own centers
    pub async fn create_educenter(&self, user: &User, center: NewEducenter) -> Result<Educenter> {
        self.permissions().can_create_educenter(user)?;
        let center = self.educenters_repository().store_educenter(center).await?;
        info!(slug = %center.slug(), owner = %user.username(), "created a center");
        Ok(center)
    }

    /// Return a center and its courses
    pub async fn get_educenter(&self, slug: &str) -> Result<Educenter> {
        self.educenters_repository()
            .get_educenter_by_slug(slug)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("center {slug}")))
    }

    pub async fn get_educenters(&self) -> Result<Vec<EducenterSummary>> {
        self.educenters_repository().get_educenters().await
    }

    /// Update the details and the courses of a center
    pub async fn update_educenter(&self, user: &User, center: Educenter) -> Result<Educenter> {
        self.permissions().can_change_educenter(user)?;
        let repository = self.educenters_repository();
        repository.update_educenter(&center).await?;
        repository
            .get_educenter(center.id())
            .await?
            .ok_or_else(|| ApiError::not_found(format!("center {}", center.slug())))
    }

    pub async fn delete_educenter(&self, user: &User, slug: &str) -> Result<()> {
        self.permissions().can_change_educenter(user)?;
        let center = self.get_educenter(slug).await?;
        self.educenters_repository()
            .delete_educenter(center.id())
            .await?;
        info!(%slug, "deleted a center");
        Ok(())
    }

    /// Create a course, its slug is derived from its title when not given
    pub async fn create_course(&self, title: &str, slug: Option<&str>) -> Result<Course> {
        self.courses_repository().store_course(title, slug).await
    }

    pub async fn get_courses(&self) -> Result<Vec<Course>> {
        self.courses_repository().get_courses().await
    }
}
