//! Roster Test Utilities
//!
//! Shared test infrastructure for the Roster workspace:
//! - Proptest generators for entities and snapshots
//! - Instrumented stores that count gateway calls
//! - Test fixtures for common scenarios
//! - Assertions for store and snapshot results

// Re-export the in-memory store from its source crate
pub use roster_storage::InMemoryEntityStore;

// Re-export core types for convenience
pub use roster_core::{
    new_entity_id, Entity, EntityId, NewEntity, Snapshot, StoreError, StoreResult, Timestamp,
};

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use roster_storage::EntityStore;

// ============================================================================
// INSTRUMENTED STORES
// ============================================================================

/// Number of calls a [`CountingStore`] has seen per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub fetch_all: usize,
    pub insert_one: usize,
    pub find_and_replace_one: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.fetch_all + self.insert_one + self.find_and_replace_one
    }
}

/// In-memory store that records every gateway call before delegating.
///
/// Calls are counted even when the inner store is offline, so tests can
/// tell "rejected before the store" apart from "store failed".
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: InMemoryEntityStore,
    fetch_all: AtomicUsize,
    insert_one: AtomicUsize,
    find_and_replace_one: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entities(entities: Vec<Entity>) -> Self {
        Self {
            inner: InMemoryEntityStore::with_entities(entities),
            ..Self::default()
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.inner.set_offline(offline);
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            fetch_all: self.fetch_all.load(Ordering::SeqCst),
            insert_one: self.insert_one.load(Ordering::SeqCst),
            find_and_replace_one: self.find_and_replace_one.load(Ordering::SeqCst),
        }
    }
}

#[async_trait]
impl EntityStore for CountingStore {
    async fn fetch_all(&self) -> StoreResult<Snapshot> {
        self.fetch_all.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_all().await
    }

    async fn insert_one(&self, candidate: NewEntity) -> StoreResult<Entity> {
        self.insert_one.fetch_add(1, Ordering::SeqCst);
        self.inner.insert_one(candidate).await
    }

    async fn find_and_replace_one(&self, id: EntityId, title: String) -> StoreResult<Entity> {
        self.find_and_replace_one.fetch_add(1, Ordering::SeqCst);
        self.inner.find_and_replace_one(id, title).await
    }
}

/// Store whose every call fails with a clone of the configured error.
#[derive(Debug, Clone)]
pub struct FailingStore {
    error: StoreError,
}

impl FailingStore {
    pub fn new(error: StoreError) -> Self {
        Self { error }
    }

    /// Store that behaves like an unreachable database.
    pub fn unavailable() -> Self {
        Self::new(StoreError::unavailable("connection refused"))
    }
}

#[async_trait]
impl EntityStore for FailingStore {
    async fn fetch_all(&self) -> StoreResult<Snapshot> {
        Err(self.error.clone())
    }

    async fn insert_one(&self, _candidate: NewEntity) -> StoreResult<Entity> {
        Err(self.error.clone())
    }

    async fn find_and_replace_one(&self, _id: EntityId, _title: String) -> StoreResult<Entity> {
        Err(self.error.clone())
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating Roster types.

    use super::*;
    use proptest::prelude::*;
    use uuid::Uuid;

    /// Generate a random UUID.
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    /// Generate an EntityId.
    pub fn arb_entity_id() -> impl Strategy<Value = EntityId> {
        arb_uuid()
    }

    /// Generate a title. Titles are free-form, so this includes empty and
    /// non-ASCII strings.
    pub fn arb_title() -> impl Strategy<Value = String> {
        prop_oneof![
            3 => "[a-zA-Z0-9 ]{1,32}",
            1 => Just(String::new()),
            1 => "\\PC{0,16}",
        ]
    }

    pub fn arb_entity() -> impl Strategy<Value = Entity> {
        (arb_entity_id(), arb_title()).prop_map(|(id, title)| Entity::new(id, title))
    }

    /// Generate a snapshot of up to `max_len` entities with distinct ids.
    pub fn arb_snapshot(max_len: usize) -> impl Strategy<Value = Snapshot> {
        prop::collection::vec(arb_title(), 0..=max_len).prop_map(|titles| {
            Snapshot::new(
                titles
                    .into_iter()
                    .map(|title| Entity::new(new_entity_id(), title))
                    .collect(),
            )
        })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;

    /// Create an entity with a fresh id.
    pub fn entity(title: &str) -> Entity {
        Entity::new(new_entity_id(), title)
    }

    /// Create entities with fresh ids, one per title.
    pub fn entities(titles: &[&str]) -> Vec<Entity> {
        titles.iter().map(|title| entity(title)).collect()
    }

    /// A counting store seeded with `titles`.
    pub fn seeded_counting_store(titles: &[&str]) -> CountingStore {
        CountingStore::with_entities(entities(titles))
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertion helpers for Roster-specific results.

    use super::*;

    pub fn assert_not_found<T: std::fmt::Debug>(result: &StoreResult<T>, id: EntityId) {
        match result {
            Err(StoreError::NotFound { id: missing }) => assert_eq!(*missing, id),
            other => panic!("Expected NotFound for {}, got {:?}", id, other),
        }
    }

    pub fn assert_unavailable<T: std::fmt::Debug>(result: &StoreResult<T>) {
        assert!(
            matches!(result, Err(StoreError::Unavailable { .. })),
            "Expected Unavailable, got {:?}",
            result
        );
    }

    /// Assert that `snapshot` contains exactly one entity with `id`.
    pub fn assert_contains_once(snapshot: &Snapshot, id: EntityId) {
        let count = snapshot.iter().filter(|e| e.id == id).count();
        assert_eq!(count, 1, "Expected entity {} exactly once, found {}", id, count);
    }

    /// Assert that no two entities in `snapshot` share an id.
    pub fn assert_unique_ids(snapshot: &Snapshot) {
        let mut ids: Vec<EntityId> = snapshot.iter().map(|e| e.id).collect();
        ids.sort();
        let before = ids.len();
        ids.dedup();
        assert_eq!(before, ids.len(), "Snapshot contains duplicate ids");
    }
}
