use core::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::educenters::{CourseId, EducenterId};
use crate::error::{ApiError, Result, StorageError};
use crate::users::UserId;

/// Identifier of a stored application
pub type ApplicationId = i64;

/// Position of an application in the sequence of all applications.
///
/// Indices start at 1, are unique across all applications and are never reused
/// while a larger index exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationIndex(u64);

impl ApplicationIndex {
    /// Index given to the first application
    pub const FIRST: ApplicationIndex = ApplicationIndex(1);

    pub fn new(value: u64) -> ApplicationIndex {
        ApplicationIndex(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Return the index directly following the current maximum index.
    /// Without any maximum this is the first index.
    pub fn following(max_index: Option<ApplicationIndex>) -> Result<ApplicationIndex> {
        match max_index {
            None => Ok(Self::FIRST),
            Some(ApplicationIndex(max)) => max
                .checked_add(1)
                .filter(|next| i64::try_from(*next).is_ok())
                .map(ApplicationIndex)
                .ok_or_else(|| ApiError::message("the application index space is exhausted")),
        }
    }

    /// SQLite integers are signed, indices always fit since they stay below i64::MAX
    pub(crate) fn to_sql(self) -> i64 {
        self.0 as i64
    }

    pub(crate) fn from_sql(value: i64) -> Result<ApplicationIndex> {
        match u64::try_from(value) {
            Ok(index) if index >= 1 => Ok(ApplicationIndex(index)),
            _ => Err(StorageError::decode("app_index", format!("invalid index {value}")).into()),
        }
    }
}

impl Display for ApplicationIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An application which has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    owner_id: UserId,
    center_id: EducenterId,
    course_id: CourseId,
    content: String,
}

impl NewApplication {
    pub fn new(
        owner_id: UserId,
        center_id: EducenterId,
        course_id: CourseId,
        content: impl Into<String>,
    ) -> NewApplication {
        NewApplication {
            owner_id,
            center_id,
            course_id,
            content: content.into(),
        }
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn center_id(&self) -> EducenterId {
        self.center_id
    }

    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// An application waiting for its index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingApplication {
    /// The application is not stored yet, it is inserted together with its index
    New(NewApplication),
    /// The application is already stored but its index was never set
    Unindexed(ApplicationId),
}

/// A stored application, with its index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    id: ApplicationId,
    owner_id: UserId,
    center_id: EducenterId,
    course_id: CourseId,
    index: ApplicationIndex,
    content: String,
    created_at: DateTime<Utc>,
}

impl Application {
    pub(crate) fn new(
        id: ApplicationId,
        owner_id: UserId,
        center_id: EducenterId,
        course_id: CourseId,
        index: ApplicationIndex,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Application {
        Application {
            id,
            owner_id,
            center_id,
            course_id,
            index,
            content: content.into(),
            created_at,
        }
    }

    pub fn id(&self) -> ApplicationId {
        self.id
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn center_id(&self) -> EducenterId {
        self.center_id
    }

    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    pub fn index(&self) -> ApplicationIndex {
        self.index
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }

    /// Return a copy of this application with a different content
    pub fn with_content(self, content: impl Into<String>) -> Application {
        Application {
            content: content.into(),
            ..self
        }
    }

    /// Return a copy of this application for another center and course
    pub fn with_course(self, center_id: EducenterId, course_id: CourseId) -> Application {
        Application {
            center_id,
            course_id,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_following_index() {
        assert_eq!(ApplicationIndex::following(None).unwrap(), ApplicationIndex::FIRST);
        assert_eq!(
            ApplicationIndex::following(Some(ApplicationIndex::new(41))).unwrap(),
            ApplicationIndex::new(42)
        );
        assert!(ApplicationIndex::following(Some(ApplicationIndex::new(i64::MAX as u64))).is_err());
    }

    #[test]
    fn test_index_from_sql() {
        assert_eq!(ApplicationIndex::from_sql(7).unwrap(), ApplicationIndex::new(7));
        assert!(ApplicationIndex::from_sql(0).is_err());
        assert!(ApplicationIndex::from_sql(-3).is_err());
    }

    #[test]
    fn test_updates_keep_the_index() {
        let application = Application::new(
            1,
            10,
            20,
            30,
            ApplicationIndex::new(4),
            "first version",
            Utc::now(),
        );
        let updated = application
            .clone()
            .with_content("second version")
            .with_course(21, 31);
        assert_eq!(updated.index(), application.index());
        assert_eq!(updated.created_at(), application.created_at());
        assert_eq!(updated.content(), "second version");
        assert_eq!((updated.center_id(), updated.course_id()), (21, 31));
    }
}
