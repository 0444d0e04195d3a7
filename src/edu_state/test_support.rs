use crate::edu_state::EduState;
use crate::error::Result;
use crate::storage::database::SqlxDatabase;

/// Test support
impl EduState {
    /// Return a test EduState backed by an in-memory database
    pub async fn test() -> Result<Self> {
        Ok(Self::new(SqlxDatabase::in_memory("educenters state").await?))
    }
}
