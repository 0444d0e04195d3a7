use crate::edu_state::EduState;
use crate::error::{ApiError, Result};
use crate::users::{NewUser, User};

impl EduState {
    pub async fn register_user(&self, user: NewUser) -> Result<User> {
        let user = self.users_repository().store_user(user).await?;
        info!(username = %user.username(), "registered a user");
        Ok(user)
    }

    pub async fn get_user(&self, username: &str) -> Result<User> {
        self.users_repository()
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("user {username}")))
    }

    /// Give a role to a user and return the updated user
    pub async fn set_user_role(&self, username: &str, role_name: &str) -> Result<User> {
        let repository = self.users_repository();
        let user = self.get_user(username).await?;
        repository.set_user_role(user.id(), role_name).await?;
        self.get_user(username).await
    }
}
