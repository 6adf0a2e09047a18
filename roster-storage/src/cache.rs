//! Snapshot cache serving all entity reads from memory.
//!
//! The cache holds exactly one live [`Snapshot`] behind an `Arc`. Readers
//! clone the `Arc` under a shared lock and walk away with an immutable
//! handle; the writer builds the next `Arc` outside the lock and swaps the
//! pointer under the exclusive lock. A reader therefore sees the snapshot
//! from before a swap or the one after it, never a mix.

use std::sync::{Arc, PoisonError, RwLock};

use roster_core::Snapshot;

/// In-memory holder of the last known full set of entities.
///
/// Request handlers only ever call [`read`](Self::read). The refresher is the
/// expected sole caller of [`replace`](Self::replace), but concurrent writers
/// are still serialized by the lock.
#[derive(Debug, Default)]
pub struct EntityCache {
    current: RwLock<Arc<Snapshot>>,
}

impl EntityCache {
    /// Create a cache holding the empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache seeded with an initial snapshot.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Return the current snapshot.
    ///
    /// Holds the shared lock only for the `Arc` clone. Never fails: a
    /// poisoned lock still guards a fully installed snapshot, so it is
    /// served as-is.
    pub fn read(&self) -> Arc<Snapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Install `snapshot` as the current snapshot.
    ///
    /// Every `read` that starts after this returns observes `snapshot` until
    /// the next replace. The previous snapshot is released after the lock is
    /// dropped; readers still holding it keep it alive.
    pub fn replace(&self, snapshot: Snapshot) {
        let next = Arc::new(snapshot);
        let previous = {
            let mut guard = self
                .current
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *guard, next)
        };
        drop(previous);
    }

    /// Number of entities in the current snapshot.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the current snapshot holds no entities, as before the first
    /// successful refresh.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
