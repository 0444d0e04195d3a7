use async_trait::async_trait;

use crate::applications::{Application, ApplicationId, ApplicationIndex, ApplicationsRepository};
use crate::educenters::{
    Course, CourseId, CoursesRepository, Educenter, EducenterId, EducenterSummary,
    EducentersRepository, NewEducenter,
};
use crate::error::Result;
use crate::users::{NewUser, Role, User, UserId, UsersRepository};

/// Maximum number of retries when the database is locked by another connection
const MAX_LOCKED_RETRIES: u32 = 100;

macro_rules! retry {
    ($async_function:expr) => {{
        let mut retries = 0;
        loop {
            match $async_function.await {
                Ok(result) => break Ok(result),
                Err(err) => {
                    if err.to_string().contains("database is locked")
                        && retries < MAX_LOCKED_RETRIES
                    {
                        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
                    } else {
                        break Err(err);
                    }
                    retries += 1;
                }
            }
        }
    }};
}

/// This wrapper retries the calls to a repository while the database is locked.
///
/// It is not used for the allocation of application indices, which manages its own
/// transactions and retries.
#[derive(Clone)]
pub(crate) struct AutoRetry<T: Sized + Send + Sync + 'static> {
    wrapped: T,
}

impl<T: Send + Sync + 'static> AutoRetry<T> {
    pub(crate) fn new(wrapped_trait: T) -> AutoRetry<T> {
        Self {
            wrapped: wrapped_trait,
        }
    }
}

#[async_trait]
impl<T: ApplicationsRepository> ApplicationsRepository for AutoRetry<T> {
    async fn get_application(&self, id: ApplicationId) -> Result<Option<Application>> {
        retry!(self.wrapped.get_application(id))
    }

    async fn get_application_by_index(
        &self,
        index: ApplicationIndex,
    ) -> Result<Option<Application>> {
        retry!(self.wrapped.get_application_by_index(index))
    }

    async fn get_applications(&self) -> Result<Vec<Application>> {
        retry!(self.wrapped.get_applications())
    }

    async fn get_applications_by_owner(&self, owner_id: UserId) -> Result<Vec<Application>> {
        retry!(self.wrapped.get_applications_by_owner(owner_id))
    }

    async fn get_unindexed_applications(&self) -> Result<Vec<ApplicationId>> {
        retry!(self.wrapped.get_unindexed_applications())
    }

    async fn update_without_reallocation(&self, application: &Application) -> Result<()> {
        retry!(self.wrapped.update_without_reallocation(application))
    }

    async fn delete_application(&self, id: ApplicationId) -> Result<()> {
        retry!(self.wrapped.delete_application(id))
    }
}

#[async_trait]
impl<T: CoursesRepository> CoursesRepository for AutoRetry<T> {
    async fn store_course(&self, title: &str, slug: Option<&str>) -> Result<Course> {
        retry!(self.wrapped.store_course(title, slug))
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>> {
        retry!(self.wrapped.get_course(id))
    }

    async fn get_course_by_slug(&self, slug: &str) -> Result<Option<Course>> {
        retry!(self.wrapped.get_course_by_slug(slug))
    }

    async fn get_courses(&self) -> Result<Vec<Course>> {
        retry!(self.wrapped.get_courses())
    }

    async fn delete_course(&self, id: CourseId) -> Result<()> {
        retry!(self.wrapped.delete_course(id))
    }
}

#[async_trait]
impl<T: EducentersRepository> EducentersRepository for AutoRetry<T> {
    async fn store_educenter(&self, center: NewEducenter) -> Result<Educenter> {
        retry!(self.wrapped.store_educenter(center.clone()))
    }

    async fn get_educenter(&self, id: EducenterId) -> Result<Option<Educenter>> {
        retry!(self.wrapped.get_educenter(id))
    }

    async fn get_educenter_by_slug(&self, slug: &str) -> Result<Option<Educenter>> {
        retry!(self.wrapped.get_educenter_by_slug(slug))
    }

    async fn get_educenters(&self) -> Result<Vec<EducenterSummary>> {
        retry!(self.wrapped.get_educenters())
    }

    async fn update_educenter(&self, center: &Educenter) -> Result<()> {
        retry!(self.wrapped.update_educenter(center))
    }

    async fn set_educenter_courses(
        &self,
        center_id: EducenterId,
        course_ids: &[CourseId],
    ) -> Result<()> {
        retry!(self.wrapped.set_educenter_courses(center_id, course_ids))
    }

    async fn delete_educenter(&self, id: EducenterId) -> Result<()> {
        retry!(self.wrapped.delete_educenter(id))
    }
}

#[async_trait]
impl<T: UsersRepository> UsersRepository for AutoRetry<T> {
    async fn store_role(&self, name: &str) -> Result<Role> {
        retry!(self.wrapped.store_role(name))
    }

    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        retry!(self.wrapped.get_role_by_name(name))
    }

    async fn store_user(&self, user: NewUser) -> Result<User> {
        retry!(self.wrapped.store_user(user.clone()))
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        retry!(self.wrapped.get_user(id))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        retry!(self.wrapped.get_user_by_username(username))
    }

    async fn set_user_role(&self, id: UserId, role_name: &str) -> Result<()> {
        retry!(self.wrapped.set_user_role(id, role_name))
    }

    async fn get_users(&self) -> Result<Vec<User>> {
        retry!(self.wrapped.get_users())
    }
}
