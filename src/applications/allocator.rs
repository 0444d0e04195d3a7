use std::sync::Arc;

use crate::applications::{
    Application, ApplicationId, ApplicationIndex, ApplicationIndexStore, NewApplication,
    PendingApplication,
};
use crate::error::{ApiError, Result};

/// Number of transactions tried before giving up on allocating an index
pub const MAX_ALLOCATION_ATTEMPTS: u32 = 5;

/// The IndexAllocator gives each application the index following the largest stored index.
///
/// Every attempt runs in its own transaction: the maximum index is read, then the application
/// is committed with `max + 1`. The unique constraint on indices decides between concurrent
/// attempts. The losers start again with a fresh transaction, at most `MAX_ALLOCATION_ATTEMPTS`
/// times in total, and then fail with `ApiError::AllocationExhausted`.
///
/// Applications which already have an index must never come back here, they are
/// updated with `ApplicationsRepository::update_without_reallocation`.
#[derive(Clone)]
pub struct IndexAllocator {
    store: Arc<dyn ApplicationIndexStore>,
}

impl IndexAllocator {
    pub fn new(store: Arc<dyn ApplicationIndexStore>) -> Self {
        Self { store }
    }

    /// Store a new application with the next available index
    pub async fn create_with_allocated_index(
        &self,
        application: NewApplication,
    ) -> Result<Application> {
        self.allocate(PendingApplication::New(application)).await
    }

    /// Give the next available index to an application stored without one
    pub async fn assign_index(&self, id: ApplicationId) -> Result<Application> {
        self.allocate(PendingApplication::Unindexed(id)).await
    }

    async fn allocate(&self, pending: PendingApplication) -> Result<Application> {
        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let mut allocation = self.store.begin_allocation().await?;
            let index = ApplicationIndex::following(allocation.max_index().await?)?;
            debug!(%index, attempt, "allocating an application index");

            match allocation
                .commit_with_unique_constraint(&pending, index)
                .await
            {
                Ok(application) => {
                    debug!(%index, id = application.id(), "application index allocated");
                    return Ok(application);
                }
                Err(e) if e.is_constraint_violation() => {
                    warn!(%index, attempt, "the application index was taken concurrently: {e}");
                }
                Err(e) => return Err(e),
            }
        }

        warn!("no application index could be allocated after {MAX_ALLOCATION_ATTEMPTS} attempts");
        Err(ApiError::AllocationExhausted {
            attempts: MAX_ALLOCATION_ATTEMPTS,
        })
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use futures::future::join_all;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::applications::{IndexAllocation, InMemoryApplicationIndexStore};
    use crate::error::StorageError;

    #[tokio::test]
    async fn test_first_index_and_gaps() -> Result<()> {
        let store = InMemoryApplicationIndexStore::new();
        let allocator = IndexAllocator::new(Arc::new(store.clone()));

        let first = allocator
            .create_with_allocated_index(new_application("first"))
            .await?;
        let second = allocator
            .create_with_allocated_index(new_application("second"))
            .await?;
        let third = allocator
            .create_with_allocated_index(new_application("third"))
            .await?;
        assert_eq!(first.index(), ApplicationIndex::FIRST);
        assert_eq!(second.index(), ApplicationIndex::new(2));
        assert_eq!(third.index(), ApplicationIndex::new(3));

        // deleting an application in the middle leaves a gap
        store.delete(second.id())?;
        let fourth = allocator
            .create_with_allocated_index(new_application("fourth"))
            .await?;
        assert_eq!(fourth.index(), ApplicationIndex::new(4));

        // deleting the last application makes its index available again
        store.delete(fourth.id())?;
        let fifth = allocator
            .create_with_allocated_index(new_application("fifth"))
            .await?;
        assert_eq!(fifth.index(), ApplicationIndex::new(4));
        Ok(())
    }

    #[tokio::test]
    async fn test_exhaustion_after_repeated_conflicts() -> Result<()> {
        let store = Arc::new(FailingStore::new(|| {
            StorageError::ConstraintViolation("application.app_index".into()).into()
        }));
        let allocator = IndexAllocator::new(store.clone());

        let result = allocator
            .create_with_allocated_index(new_application("conflicting"))
            .await;
        assert!(matches!(
            result,
            Err(ApiError::AllocationExhausted { attempts: 5 })
        ));
        assert_eq!(store.attempts(), MAX_ALLOCATION_ATTEMPTS);
        Ok(())
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() -> Result<()> {
        let store = Arc::new(FailingStore::new(|| {
            StorageError::Database(sqlx::Error::PoolTimedOut).into()
        }));
        let allocator = IndexAllocator::new(store.clone());

        let result = allocator.assign_index(12).await;
        assert!(matches!(
            result,
            Err(ApiError::Storage(StorageError::Database(_)))
        ));
        assert_eq!(store.attempts(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_allocations() -> Result<()> {
        let store = InMemoryApplicationIndexStore::new();
        let allocator = IndexAllocator::new(Arc::new(YieldingStore {
            inner: store.clone(),
        }));

        // all the allocations read the same maximum before anyone commits,
        // so the last one only succeeds on its last attempt
        let results = join_all((0..MAX_ALLOCATION_ATTEMPTS).map(|n| {
            allocator.create_with_allocated_index(new_application(&format!("concurrent {n}")))
        }))
        .await;
        let indices: BTreeSet<u64> = results
            .into_iter()
            .map(|r| r.map(|a| a.index().value()))
            .collect::<Result<_>>()?;
        assert_eq!(indices, (1..=5).collect::<BTreeSet<u64>>());
        assert_eq!(store.applications()?.len(), 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_too_many_concurrent_allocations() -> Result<()> {
        let store = InMemoryApplicationIndexStore::new();
        let allocator = IndexAllocator::new(Arc::new(YieldingStore {
            inner: store.clone(),
        }));

        let results = join_all((0..6).map(|n| {
            allocator.create_with_allocated_index(new_application(&format!("concurrent {n}")))
        }))
        .await;
        let (created, failed): (Vec<_>, Vec<_>) = results.into_iter().partition(|r| r.is_ok());
        assert_eq!(created.len(), 5);
        assert!(matches!(
            failed.as_slice(),
            [Err(ApiError::AllocationExhausted { attempts: 5 })]
        ));

        // the failed allocation did not leave anything behind
        let indices: Vec<u64> = store
            .applications()?
            .iter()
            .map(|a| a.index().value())
            .collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5]);
        Ok(())
    }

    #[tokio::test]
    async fn test_assign_index() -> Result<()> {
        let store = InMemoryApplicationIndexStore::new();
        let allocator = IndexAllocator::new(Arc::new(store.clone()));
        allocator
            .create_with_allocated_index(new_application("indexed"))
            .await?;
        let id = store.insert_unindexed(new_application("imported"))?;

        let application = allocator.assign_index(id).await?;
        assert_eq!(application.id(), id);
        assert_eq!(application.index(), ApplicationIndex::new(2));

        // an indexed application is never given another index
        let result = allocator.assign_index(id).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
        assert_eq!(store.applications()?.len(), 2);
        Ok(())
    }

    /// HELPERS
    fn new_application(content: &str) -> NewApplication {
        NewApplication::new(1, 1, 1, content)
    }

    /// This store fails every commit with the same error and counts the attempts
    struct FailingStore {
        error: fn() -> ApiError,
        attempts: Arc<AtomicU32>,
    }

    impl FailingStore {
        fn new(error: fn() -> ApiError) -> Self {
            Self {
                error,
                attempts: Arc::new(AtomicU32::new(0)),
            }
        }

        fn attempts(&self) -> u32 {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ApplicationIndexStore for FailingStore {
        async fn begin_allocation(&self) -> Result<Box<dyn IndexAllocation>> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FailingAllocation { error: self.error }))
        }
    }

    struct FailingAllocation {
        error: fn() -> ApiError,
    }

    #[async_trait]
    impl IndexAllocation for FailingAllocation {
        async fn max_index(&mut self) -> Result<Option<ApplicationIndex>> {
            Ok(None)
        }

        async fn commit_with_unique_constraint(
            self: Box<Self>,
            _pending: &PendingApplication,
            _index: ApplicationIndex,
        ) -> Result<Application> {
            Err((self.error)())
        }
    }

    /// This store yields to the other tasks right after reading the maximum index
    struct YieldingStore {
        inner: InMemoryApplicationIndexStore,
    }

    #[async_trait]
    impl ApplicationIndexStore for YieldingStore {
        async fn begin_allocation(&self) -> Result<Box<dyn IndexAllocation>> {
            Ok(Box::new(YieldingAllocation {
                inner: self.inner.begin_allocation().await?,
            }))
        }
    }

    struct YieldingAllocation {
        inner: Box<dyn IndexAllocation>,
    }

    #[async_trait]
    impl IndexAllocation for YieldingAllocation {
        async fn max_index(&mut self) -> Result<Option<ApplicationIndex>> {
            let max_index = self.inner.max_index().await?;
            tokio::task::yield_now().await;
            Ok(max_index)
        }

        async fn commit_with_unique_constraint(
            self: Box<Self>,
            pending: &PendingApplication,
            index: ApplicationIndex,
        ) -> Result<Application> {
            self.inner
                .commit_with_unique_constraint(pending, index)
                .await
        }
    }
}
