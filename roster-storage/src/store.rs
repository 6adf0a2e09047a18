//! Store gateway trait.
//!
//! Three operations against the persistent store. Implementations own no
//! state besides their connection handle and make at most one attempt per
//! call.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use roster_core::{Entity, EntityId, NewEntity, Snapshot, StoreError, StoreResult};

/// Async persistence operations used by the request handlers and the
/// refresher.
///
/// Implementations must be safe for concurrent use: a refresh may run at the
/// same time as any number of inserts and updates.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Load every entity, in whatever order the store yields them.
    async fn fetch_all(&self) -> StoreResult<Snapshot>;

    /// Insert a new entity. The store assigns the identifier.
    async fn insert_one(&self, candidate: NewEntity) -> StoreResult<Entity>;

    /// Replace the title of the entity with `id` and return the stored result.
    ///
    /// Fails with [`StoreError::NotFound`] if no entity has that id.
    async fn find_and_replace_one(&self, id: EntityId, title: String) -> StoreResult<Entity>;
}

#[async_trait]
impl<S> EntityStore for Arc<S>
where
    S: EntityStore + ?Sized,
{
    async fn fetch_all(&self) -> StoreResult<Snapshot> {
        (**self).fetch_all().await
    }

    async fn insert_one(&self, candidate: NewEntity) -> StoreResult<Entity> {
        (**self).insert_one(candidate).await
    }

    async fn find_and_replace_one(&self, id: EntityId, title: String) -> StoreResult<Entity> {
        (**self).find_and_replace_one(id, title).await
    }
}

/// Bounds every call of the wrapped store by a fixed timeout.
///
/// A slow store surfaces as [`StoreError::TimedOut`] instead of stalling the
/// refresher or a request handler. The inner future is dropped on timeout.
#[derive(Debug, Clone)]
pub struct TimeoutStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S> TimeoutStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>> + Send,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Store operation timed out"
                );
                Err(StoreError::TimedOut {
                    operation,
                    after: self.timeout,
                })
            }
        }
    }
}

#[async_trait]
impl<S: EntityStore> EntityStore for TimeoutStore<S> {
    async fn fetch_all(&self) -> StoreResult<Snapshot> {
        self.bounded("fetch_all", self.inner.fetch_all()).await
    }

    async fn insert_one(&self, candidate: NewEntity) -> StoreResult<Entity> {
        self.bounded("insert_one", self.inner.insert_one(candidate)).await
    }

    async fn find_and_replace_one(&self, id: EntityId, title: String) -> StoreResult<Entity> {
        self.bounded(
            "find_and_replace_one",
            self.inner.find_and_replace_one(id, title),
        )
        .await
    }
}
