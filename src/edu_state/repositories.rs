use std::sync::Arc;

use crate::applications::{ApplicationsRepository, ApplicationsSqlxDatabase, IndexAllocator};
use crate::edu_state::EduState;
use crate::educenters::{
    CoursesRepository, CoursesSqlxDatabase, EducentersRepository, EducentersSqlxDatabase,
};
use crate::storage::AutoRetry;
use crate::users::{UsersRepository, UsersSqlxDatabase};

/// These functions create repository implementations to access data
/// stored in the database
impl EduState {
    pub(super) fn applications_repository(&self) -> Arc<dyn ApplicationsRepository> {
        Arc::new(AutoRetry::new(ApplicationsSqlxDatabase::new(
            self.database(),
        )))
    }

    /// The allocator runs its own transactions, it is not wrapped with AutoRetry
    pub(super) fn index_allocator(&self) -> IndexAllocator {
        IndexAllocator::new(Arc::new(ApplicationsSqlxDatabase::new(self.database())))
    }

    pub(super) fn courses_repository(&self) -> Arc<dyn CoursesRepository> {
        Arc::new(AutoRetry::new(CoursesSqlxDatabase::new(self.database())))
    }

    pub(super) fn educenters_repository(&self) -> Arc<dyn EducentersRepository> {
        Arc::new(AutoRetry::new(EducentersSqlxDatabase::new(self.database())))
    }

    pub(super) fn users_repository(&self) -> Arc<dyn UsersRepository> {
        Arc::new(AutoRetry::new(UsersSqlxDatabase::new(self.database())))
    }
}
