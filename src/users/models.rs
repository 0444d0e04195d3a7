use serde::{Deserialize, Serialize};

use crate::educenters::models::check_length;
use crate::error::Result;

pub type UserId = i64;
pub type RoleId = i64;

/// Users having this role can create education centers
pub const EDU_OWNER_ROLE: &str = "edu_owner";

const MAX_PHONE_NUMBER_LENGTH: usize = 13;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    name: String,
}

impl Role {
    pub(crate) fn new(id: RoleId, name: impl Into<String>) -> Role {
        Role {
            id,
            name: name.into(),
        }
    }

    pub fn id(&self) -> RoleId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A user which has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub is_staff: bool,
}

impl NewUser {
    pub fn new(username: impl Into<String>, phone_number: impl Into<String>) -> NewUser {
        NewUser {
            username: username.into(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone_number: phone_number.into(),
            is_staff: false,
        }
    }

    pub fn with_name(self, first_name: impl Into<String>, last_name: impl Into<String>) -> NewUser {
        NewUser {
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..self
        }
    }

    pub fn with_email(self, email: impl Into<String>) -> NewUser {
        NewUser {
            email: email.into(),
            ..self
        }
    }

    pub fn staff(self) -> NewUser {
        NewUser {
            is_staff: true,
            ..self
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        check_length("phone number", &self.phone_number, MAX_PHONE_NUMBER_LENGTH)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    username: String,
    first_name: String,
    last_name: String,
    email: String,
    phone_number: String,
    is_staff: bool,
    role: Option<Role>,
}

impl User {
    pub(crate) fn new(id: UserId, user: NewUser, role: Option<Role>) -> User {
        User {
            id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone_number: user.phone_number,
            is_staff: user.is_staff,
            role,
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    pub fn is_staff(&self) -> bool {
        self.is_staff
    }

    pub fn role(&self) -> Option<&Role> {
        self.role.as_ref()
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.role.as_ref().is_some_and(|r| r.name() == name)
    }
}
