//! In-memory store for tests and local development.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use roster_core::{new_entity_id, Entity, EntityId, NewEntity, Snapshot, StoreError, StoreResult};

use crate::store::EntityStore;

/// Vector-backed [`EntityStore`].
///
/// Keeps insertion order, assigns UUIDv7 ids, and can be switched offline to
/// simulate an unreachable store.
#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    entities: RwLock<Vec<Entity>>,
    offline: AtomicBool,
}

impl InMemoryEntityStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with entities.
    pub fn with_entities(entities: Vec<Entity>) -> Self {
        Self {
            entities: RwLock::new(entities),
            offline: AtomicBool::new(false),
        }
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`]
    /// (`true`) or succeed again (`false`).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    /// Number of stored entities, ignoring the offline switch.
    pub fn len(&self) -> usize {
        self.entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds no entities, ignoring the offline switch.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.is_offline() {
            return Err(StoreError::unavailable("in-memory store is offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn fetch_all(&self) -> StoreResult<Snapshot> {
        self.check_online()?;
        let entities = self
            .entities
            .read()
            .map_err(|_| StoreError::backend("entity lock poisoned"))?;
        Ok(Snapshot::new(entities.clone()))
    }

    async fn insert_one(&self, candidate: NewEntity) -> StoreResult<Entity> {
        self.check_online()?;
        let entity = candidate.with_id(new_entity_id());
        self.entities
            .write()
            .map_err(|_| StoreError::backend("entity lock poisoned"))?
            .push(entity.clone());
        Ok(entity)
    }

    async fn find_and_replace_one(&self, id: EntityId, title: String) -> StoreResult<Entity> {
        self.check_online()?;
        let mut entities = self
            .entities
            .write()
            .map_err(|_| StoreError::backend("entity lock poisoned"))?;
        let entity = entities
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(StoreError::NotFound { id })?;
        entity.title = title;
        Ok(entity.clone())
    }
}
