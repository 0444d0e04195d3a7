use crate::applications::Application;
use crate::error::{ApiError, Result};
use crate::users::{User, EDU_OWNER_ROLE};

/// Authorization rules checked before any change to centers or applications.
/// Each check returns `ApiError::Forbidden` when the user is not allowed to proceed.
pub trait Permissions: Send + Sync + 'static {
    fn can_create_educenter(&self, user: &User) -> Result<()>;

    fn can_change_educenter(&self, user: &User) -> Result<()>;

    fn can_create_application(&self, user: &User) -> Result<()>;

    fn can_read_application(&self, user: &User, application: &Application) -> Result<()>;

    fn can_update_application(&self, user: &User, application: &Application) -> Result<()>;

    fn can_delete_application(&self, user: &User, application: &Application) -> Result<()>;
}

/// Permissions based on the role of a user, its staff status and the ownership of applications:
///
///  - centers are created by users having the `edu_owner` role
///  - centers are updated and deleted by staff users
///  - applications are created by any user
///  - applications are read and updated by their owner or by staff users
///  - applications are only deleted by their owner
///
#[derive(Debug, Clone, Default)]
pub struct RolePermissions;

impl Permissions for RolePermissions {
    fn can_create_educenter(&self, user: &User) -> Result<()> {
        if user.has_role(EDU_OWNER_ROLE) {
            return Ok(());
        }
        Self::forbidden(user, "create a center")
    }

    fn can_change_educenter(&self, user: &User) -> Result<()> {
        if user.is_staff() {
            return Ok(());
        }
        Self::forbidden(user, "change a center")
    }

    fn can_create_application(&self, _user: &User) -> Result<()> {
        Ok(())
    }

    fn can_read_application(&self, user: &User, application: &Application) -> Result<()> {
        if application.is_owned_by(user.id()) || user.is_staff() {
            return Ok(());
        }
        Self::forbidden(user, &format!("read the application {}", application.index()))
    }

    fn can_update_application(&self, user: &User, application: &Application) -> Result<()> {
        if application.is_owned_by(user.id()) || user.is_staff() {
            return Ok(());
        }
        Self::forbidden(user, &format!("update the application {}", application.index()))
    }

    fn can_delete_application(&self, user: &User, application: &Application) -> Result<()> {
        if application.is_owned_by(user.id()) {
            return Ok(());
        }
        Self::forbidden(user, &format!("delete the application {}", application.index()))
    }
}

impl RolePermissions {
    fn forbidden(user: &User, action: &str) -> Result<()> {
        warn! {
            user = %user.username(),
            staff = user.is_staff(),
            "unauthorized user, cannot {action}"
        }
        Err(ApiError::Forbidden(format!(
            "{} cannot {action}",
            user.username()
        )))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::applications::ApplicationIndex;
    use crate::users::{NewUser, Role};

    #[test]
    fn test_center_permissions() {
        let permissions = RolePermissions;
        let owner = user(1, false, Some(EDU_OWNER_ROLE));
        let staff = user(2, true, None);
        let student = user(3, false, None);

        assert!(permissions.can_create_educenter(&owner).is_ok());
        assert!(permissions.can_create_educenter(&staff).is_err());
        assert!(permissions.can_create_educenter(&student).is_err());

        assert!(permissions.can_change_educenter(&staff).is_ok());
        assert!(permissions.can_change_educenter(&owner).is_err());
        assert!(matches!(
            permissions.can_change_educenter(&student),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn test_application_permissions() {
        let permissions = RolePermissions;
        let owner = user(1, false, None);
        let staff = user(2, true, None);
        let other = user(3, false, Some(EDU_OWNER_ROLE));
        let application = Application::new(
            10,
            owner.id(),
            1,
            1,
            ApplicationIndex::FIRST,
            "hello",
            Utc::now(),
        );

        assert!(permissions.can_create_application(&other).is_ok());

        assert!(permissions.can_read_application(&owner, &application).is_ok());
        assert!(permissions.can_read_application(&staff, &application).is_ok());
        assert!(permissions.can_read_application(&other, &application).is_err());

        assert!(permissions.can_update_application(&owner, &application).is_ok());
        assert!(permissions.can_update_application(&staff, &application).is_ok());
        assert!(permissions.can_update_application(&other, &application).is_err());

        assert!(permissions.can_delete_application(&owner, &application).is_ok());
        assert!(permissions.can_delete_application(&staff, &application).is_err());
        assert!(permissions.can_delete_application(&other, &application).is_err());
    }

    /// HELPERS
    fn user(id: i64, is_staff: bool, role: Option<&str>) -> User {
        let mut new_user = NewUser::new(format!("user-{id}"), format!("+99890000000{id}"));
        new_user.is_staff = is_staff;
        User::new(id, new_user, role.map(|name| Role::new(1, name)))
    }
}
