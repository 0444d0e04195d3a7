use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::applications::{
    Application, ApplicationId, ApplicationIndex, ApplicationIndexStore, IndexAllocation,
    NewApplication, PendingApplication,
};
use crate::error::{ApiError, Result, StorageError};

/// In-memory index store.
///
/// Allocations are optimistic: the maximum index is read without holding any lock
/// and the uniqueness of the index is only checked when committing, so two concurrent
/// allocations can pick the same index and one of them is then rejected.
#[derive(Debug, Clone, Default)]
pub struct InMemoryApplicationIndexStore {
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    last_id: ApplicationId,
    rows: BTreeMap<ApplicationId, Row>,
}

#[derive(Debug, Clone)]
struct Row {
    application: NewApplication,
    index: Option<ApplicationIndex>,
    created_at: DateTime<Utc>,
}

impl InMemoryApplicationIndexStore {
    pub fn new() -> Self {
        Default::default()
    }

    /// Return all the indexed applications, in index order
    pub fn applications(&self) -> Result<Vec<Application>> {
        let state = self.lock()?;
        let mut applications: Vec<Application> = state
            .rows
            .iter()
            .filter_map(|(id, row)| row.indexed(*id))
            .collect();
        applications.sort_by_key(|a| a.index());
        Ok(applications)
    }

    /// Store an application without an index
    pub fn insert_unindexed(&self, application: NewApplication) -> Result<ApplicationId> {
        let mut state = self.lock()?;
        let id = state.next_id();
        state.rows.insert(
            id,
            Row {
                application,
                index: None,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    /// Delete an application
    pub fn delete(&self, id: ApplicationId) -> Result<()> {
        self.lock()?.rows.remove(&id);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        lock(&self.state)
    }
}

#[async_trait]
impl ApplicationIndexStore for InMemoryApplicationIndexStore {
    async fn begin_allocation(&self) -> Result<Box<dyn IndexAllocation>> {
        Ok(Box::new(InMemoryIndexAllocation {
            state: self.state.clone(),
        }))
    }
}

struct InMemoryIndexAllocation {
    state: Arc<Mutex<State>>,
}

#[async_trait]
impl IndexAllocation for InMemoryIndexAllocation {
    async fn max_index(&mut self) -> Result<Option<ApplicationIndex>> {
        Ok(lock(&self.state)?
            .rows
            .values()
            .filter_map(|row| row.index)
            .max())
    }

    async fn commit_with_unique_constraint(
        self: Box<Self>,
        pending: &PendingApplication,
        index: ApplicationIndex,
    ) -> Result<Application> {
        let mut state = lock(&self.state)?;
        if state.rows.values().any(|row| row.index == Some(index)) {
            return Err(StorageError::ConstraintViolation(format!(
                "application.app_index {index} is already taken"
            ))
            .into());
        }

        match pending {
            PendingApplication::New(application) => {
                let id = state.next_id();
                let row = Row {
                    application: application.clone(),
                    index: Some(index),
                    created_at: Utc::now(),
                };
                let indexed = row.indexed(id);
                state.rows.insert(id, row);
                indexed.ok_or_else(|| ApiError::not_found(format!("application {id}")))
            }
            PendingApplication::Unindexed(id) => match state.rows.get_mut(id) {
                Some(row) if row.index.is_none() => {
                    row.index = Some(index);
                    row.indexed(*id)
                        .ok_or_else(|| ApiError::not_found(format!("application {id}")))
                }
                _ => Err(ApiError::not_found(format!("unindexed application {id}"))),
            },
        }
    }
}

impl State {
    fn next_id(&mut self) -> ApplicationId {
        self.last_id += 1;
        self.last_id
    }
}

impl Row {
    fn indexed(&self, id: ApplicationId) -> Option<Application> {
        self.index.map(|index| {
            Application::new(
                id,
                self.application.owner_id(),
                self.application.center_id(),
                self.application.course_id(),
                index,
                self.application.content(),
                self.created_at,
            )
        })
    }
}

fn lock(state: &Mutex<State>) -> Result<MutexGuard<'_, State>> {
    state
        .lock()
        .map_err(|_| ApiError::message("the in-memory application store is poisoned"))
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_concurrent_allocations_conflict() -> Result<()> {
        let store = InMemoryApplicationIndexStore::new();

        // two allocations read the same maximum index
        let mut first = store.begin_allocation().await?;
        let mut second = store.begin_allocation().await?;
        assert_eq!(first.max_index().await?, None);
        assert_eq!(second.max_index().await?, None);

        // only the first commit succeeds
        let pending = PendingApplication::New(NewApplication::new(1, 1, 1, ""));
        first
            .commit_with_unique_constraint(&pending, ApplicationIndex::FIRST)
            .await?;
        let result = second
            .commit_with_unique_constraint(&pending, ApplicationIndex::FIRST)
            .await;
        assert!(result.unwrap_err().is_constraint_violation());
        assert_eq!(store.applications()?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_unindexed_applications() -> Result<()> {
        let store = InMemoryApplicationIndexStore::new();
        let id = store.insert_unindexed(NewApplication::new(1, 1, 1, "imported"))?;
        assert!(store.applications()?.is_empty());

        let allocation = store.begin_allocation().await?;
        let application = allocation
            .commit_with_unique_constraint(
                &PendingApplication::Unindexed(id),
                ApplicationIndex::FIRST,
            )
            .await?;
        assert_eq!(application.id(), id);
        assert_eq!(store.applications()?, vec![application]);

        let allocation = store.begin_allocation().await?;
        let result = allocation
            .commit_with_unique_constraint(
                &PendingApplication::Unindexed(id),
                ApplicationIndex::new(2),
            )
            .await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
        Ok(())
    }
}
