use crate::applications::{Application, ApplicationIndex, NewApplication};
use crate::edu_state::EduState;
use crate::educenters::{CourseId, EducenterId};
use crate::error::{ApiError, Result};
use crate::users::User;

impl EduState {
    /// Create an application for a course of a center.
    /// The application is given the index following the largest existing index.
    pub async fn create_application(
        &self,
        owner: &User,
        center_id: EducenterId,
        course_id: CourseId,
        content: &str,
    ) -> Result<Application> {
        self.permissions().can_create_application(owner)?;
        self.check_course(center_id, course_id).await?;

        let application = self
            .index_allocator()
            .create_with_allocated_index(NewApplication::new(
                owner.id(),
                center_id,
                course_id,
                content,
            ))
            .await?;
        info!(
            index = %application.index(),
            owner = %owner.username(),
            "created an application"
        );
        Ok(application)
    }

    /// Update the center, course and content of an application.
    /// The index and the creation date of the stored application are kept.
    pub async fn update_application(
        &self,
        user: &User,
        application: Application,
    ) -> Result<Application> {
        let repository = self.applications_repository();
        let stored = repository
            .get_application(application.id())
            .await?
            .ok_or_else(|| ApiError::not_found(format!("application {}", application.id())))?;
        self.permissions().can_update_application(user, &stored)?;

        if (stored.center_id(), stored.course_id())
            != (application.center_id(), application.course_id())
        {
            self.check_course(application.center_id(), application.course_id())
                .await?;
        }

        let updated = stored
            .with_course(application.center_id(), application.course_id())
            .with_content(application.content());
        repository.update_without_reallocation(&updated).await?;
        Ok(updated)
    }

    /// Give an index to all the stored applications which don't have one yet
    pub async fn index_pending_applications(&self) -> Result<Vec<Application>> {
        let unindexed = self
            .applications_repository()
            .get_unindexed_applications()
            .await?;
        if unindexed.is_empty() {
            return Ok(vec![]);
        }

        info!("indexing {} pending applications", unindexed.len());
        let allocator = self.index_allocator();
        let mut indexed = vec![];
        for id in unindexed {
            indexed.push(allocator.assign_index(id).await?);
        }
        Ok(indexed)
    }

    /// Return the applications of a user, in index order
    pub async fn get_my_applications(&self, user: &User) -> Result<Vec<Application>> {
        self.applications_repository()
            .get_applications_by_owner(user.id())
            .await
    }

    pub async fn get_my_application(
        &self,
        user: &User,
        index: ApplicationIndex,
    ) -> Result<Application> {
        let application = self.get_application_by_index(index).await?;
        self.permissions()
            .can_read_application(user, &application)?;
        Ok(application)
    }

    pub async fn delete_my_application(&self, user: &User, index: ApplicationIndex) -> Result<()> {
        let application = self.get_application_by_index(index).await?;
        self.permissions()
            .can_delete_application(user, &application)?;
        self.applications_repository()
            .delete_application(application.id())
            .await?;
        info!(%index, owner = %user.username(), "deleted an application");
        Ok(())
    }

    async fn get_application_by_index(&self, index: ApplicationIndex) -> Result<Application> {
        self.applications_repository()
            .get_application_by_index(index)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("application {index}")))
    }

    /// The center and the course of an application must exist
    async fn check_course(&self, center_id: EducenterId, course_id: CourseId) -> Result<()> {
        if self
            .educenters_repository()
            .get_educenter(center_id)
            .await?
            .is_none()
        {
            return Err(ApiError::not_found(format!("center {center_id}")));
        }
        if self
            .courses_repository()
            .get_course(course_id)
            .await?
            .is_none()
        {
            return Err(ApiError::not_found(format!("course {course_id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::educenters::{Course, Educenter, NewEducenter};
    use crate::users::{NewUser, EDU_OWNER_ROLE};

    #[tokio::test]
    async fn test_create_applications() -> Result<()> {
        let (state, fixture) = create_state().await?;

        let first = state
            .create_application(&fixture.student, fixture.center.id(), fixture.course.id(), "")
            .await?;
        let second = state
            .create_application(
                &fixture.other_student,
                fixture.center.id(),
                fixture.course.id(),
                "please",
            )
            .await?;
        assert_eq!(first.index(), ApplicationIndex::FIRST);
        assert_eq!(second.index(), ApplicationIndex::new(2));
        assert_eq!(first.content(), "");

        // each user only lists their own applications
        assert_eq!(
            state.get_my_applications(&fixture.student).await?,
            vec![first]
        );
        assert_eq!(
            state.get_my_applications(&fixture.other_student).await?,
            vec![second]
        );

        // an application needs an existing center and course
        let result = state
            .create_application(&fixture.student, 42, fixture.course.id(), "")
            .await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
        let result = state
            .create_application(&fixture.student, fixture.center.id(), 42, "")
            .await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_keeps_the_index() -> Result<()> {
        let (state, fixture) = create_state().await?;
        let application = state
            .create_application(&fixture.student, fixture.center.id(), fixture.course.id(), "v1")
            .await?;

        // updating several times never changes the index or the creation date
        let mut updated = application.clone();
        for version in 2..5 {
            updated = state
                .update_application(
                    &fixture.student,
                    updated.with_content(format!("v{version}")),
                )
                .await?;
            assert_eq!(updated.index(), application.index());
            assert_eq!(updated.created_at(), application.created_at());
        }
        let stored = state
            .get_my_application(&fixture.student, application.index())
            .await?;
        assert_eq!(stored.content(), "v4");

        // staff users can update the application, other users can't
        state
            .update_application(&fixture.staff, stored.clone().with_content("reviewed"))
            .await?;
        let result = state
            .update_application(&fixture.other_student, stored.with_content("mine"))
            .await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_read_and_delete() -> Result<()> {
        let (state, fixture) = create_state().await?;
        let application = state
            .create_application(&fixture.student, fixture.center.id(), fixture.course.id(), "")
            .await?;
        let index = application.index();

        // read by the owner or staff only
        assert_eq!(
            state.get_my_application(&fixture.staff, index).await?,
            application
        );
        let result = state.get_my_application(&fixture.other_student, index).await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));

        // deleted by the owner only
        let result = state.delete_my_application(&fixture.staff, index).await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
        state.delete_my_application(&fixture.student, index).await?;
        let result = state.get_my_application(&fixture.student, index).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));

        // the index of a deleted last application is allocated again
        let application = state
            .create_application(&fixture.student, fixture.center.id(), fixture.course.id(), "")
            .await?;
        assert_eq!(application.index(), index);
        Ok(())
    }

    /// HELPERS
    struct Fixture {
        student: User,
        other_student: User,
        staff: User,
        center: Educenter,
        course: Course,
    }

    async fn create_state() -> Result<(EduState, Fixture)> {
        let state = EduState::test().await?;
        let owner = state
            .register_user(NewUser::new("owner", "+998900000001"))
            .await?;
        let owner = state.set_user_role(owner.username(), EDU_OWNER_ROLE).await?;
        let staff = state
            .register_user(NewUser::new("staff", "+998900000002").staff())
            .await?;
        let student = state
            .register_user(NewUser::new("student", "+998900000003"))
            .await?;
        let other_student = state
            .register_user(NewUser::new("other", "+998900000004"))
            .await?;

        let course = state.create_course("Math", None).await?;
        let center = state
            .create_educenter(&owner, NewEducenter::new("North"))
            .await?;
        Ok((
            state,
            Fixture {
                student,
                other_student,
                staff,
                center,
                course,
            },
        ))
    }
}
