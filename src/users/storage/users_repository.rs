use async_trait::async_trait;

use crate::error::Result;
use crate::users::{NewUser, Role, User, UserId};

/// This trait supports the storage of users and of their roles.
///
/// A user has at most one role, roles are identified by their name.
#[async_trait]
pub trait UsersRepository: Send + Sync + 'static {
    /// Store a role, or return the existing role with the same name
    async fn store_role(&self, name: &str) -> Result<Role>;

    /// Get a role by name
    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>>;

    /// Store a new user
    async fn store_user(&self, user: NewUser) -> Result<User>;

    /// Get a user by id
    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    /// Get a user by username
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Give a role to a user, the role is created if necessary
    async fn set_user_role(&self, id: UserId, role_name: &str) -> Result<()>;

    /// Get all the users
    async fn get_users(&self) -> Result<Vec<User>>;
}
