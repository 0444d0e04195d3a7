use async_trait::async_trait;

use crate::applications::{Application, ApplicationId, ApplicationIndex, PendingApplication};
use crate::error::Result;
use crate::users::UserId;

/// This trait gives access to the primitives needed to allocate application indices:
///
///  - an allocation runs in its own isolated transaction
///  - inside that transaction the current maximum index can be read
///  - the transaction is then committed with the pending application and its new index
///
/// The storage must enforce the uniqueness of indices. When the new index is already taken
/// the commit fails with a `StorageError::ConstraintViolation` and nothing is written.
#[async_trait]
pub trait ApplicationIndexStore: Send + Sync + 'static {
    /// Start a new allocation transaction
    async fn begin_allocation(&self) -> Result<Box<dyn IndexAllocation>>;
}

/// An allocation transaction, see `ApplicationIndexStore`.
///
/// Dropping an allocation without committing it discards it.
#[async_trait]
pub trait IndexAllocation: Send {
    /// Return the largest index currently stored, None if there is no indexed application
    async fn max_index(&mut self) -> Result<Option<ApplicationIndex>>;

    /// Store the pending application with the given index and commit the transaction.
    /// If anything fails the transaction is rolled back.
    async fn commit_with_unique_constraint(
        self: Box<Self>,
        pending: &PendingApplication,
        index: ApplicationIndex,
    ) -> Result<Application>;
}

/// This trait supports the storage of applications once they have been indexed:
///
///  - an application can be retrieved by id or by index
///  - applications can be listed, globally or per owner, in index order
///  - an application can be updated, without ever changing its index or its creation date
///  - an application can be deleted, the indices of other applications are unchanged
///
#[async_trait]
pub trait ApplicationsRepository: Send + Sync + 'static {
    /// Get an indexed application by id
    async fn get_application(&self, id: ApplicationId) -> Result<Option<Application>>;

    /// Get an application by index
    async fn get_application_by_index(
        &self,
        index: ApplicationIndex,
    ) -> Result<Option<Application>>;

    /// Get all the indexed applications
    async fn get_applications(&self) -> Result<Vec<Application>>;

    /// Get the indexed applications of a given user
    async fn get_applications_by_owner(&self, owner_id: UserId) -> Result<Vec<Application>>;

    /// Get the ids of the stored applications which have no index yet
    async fn get_unindexed_applications(&self) -> Result<Vec<ApplicationId>>;

    /// Store the center, course and content of an indexed application.
    /// The index and the creation date are never written.
    async fn update_without_reallocation(&self, application: &Application) -> Result<()>;

    /// Delete an application
    async fn delete_application(&self, id: ApplicationId) -> Result<()>;
}
