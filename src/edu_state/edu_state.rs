use std::sync::Arc;

use crate::error::Result;
use crate::permissions::{Permissions, RolePermissions};
use crate::storage::database::{DatabaseConfiguration, SqlxDatabase};

/// The EduState gives access to education centers, courses, users and applications.
///
/// All the data is kept in a SQLite database. Every operation changing a center or an
/// application first checks the permissions of the user asking for it.
#[derive(Clone)]
pub struct EduState {
    database: SqlxDatabase,
    permissions: Arc<dyn Permissions>,
}

impl EduState {
    /// Create a state for the database described by the environment variables
    pub async fn from_env() -> Result<Self> {
        Self::create(&DatabaseConfiguration::from_env()?).await
    }

    /// Create a state for a given database, the schema is migrated if necessary
    pub async fn create(configuration: &DatabaseConfiguration) -> Result<Self> {
        let database = SqlxDatabase::create(configuration).await?;
        debug!("created the educenters state with {configuration:?}");
        Ok(Self::new(database))
    }

    pub fn new(database: SqlxDatabase) -> Self {
        Self {
            database,
            permissions: Arc::new(RolePermissions),
        }
    }

    /// Return a state using different permission rules
    pub fn with_permissions(self, permissions: Arc<dyn Permissions>) -> Self {
        Self {
            permissions,
            ..self
        }
    }

    pub fn database(&self) -> SqlxDatabase {
        self.database.clone()
    }

    pub(super) fn permissions(&self) -> Arc<dyn Permissions> {
        self.permissions.clone()
    }
}
