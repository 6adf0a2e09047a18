//! Roster Core - Entity Types
//!
//! Pure data structures shared by every other crate: the entity record,
//! the snapshot the cache serves, and the error taxonomy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

pub mod error;

pub use error::{ConfigError, StoreError, StoreResult};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Entity identifier. Assigned by the store on insert, immutable afterwards.
pub type EntityId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new UUIDv7 EntityId (timestamp-sortable).
pub fn new_entity_id() -> EntityId {
    Uuid::now_v7()
}

// ============================================================================
// ENTITIES
// ============================================================================

/// A named record.
///
/// `id` is the sole key for lookup and update targeting. `title` is
/// free-form; no length or charset rules are enforced here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub title: String,
}

impl Entity {
    pub fn new(id: EntityId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }
}

/// An entity that has not been stored yet and therefore has no id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntity {
    pub title: String,
}

impl NewEntity {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// Attach a store-assigned identifier.
    pub fn with_id(self, id: EntityId) -> Entity {
        Entity {
            id,
            title: self.title,
        }
    }
}

// ============================================================================
// SNAPSHOT
// ============================================================================

/// All entities as of one successful fetch from the store.
///
/// Order is whatever the store returned. A snapshot is never edited in
/// place; the cache swaps whole snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    entities: Vec<Entity>,
    /// `None` only for the empty snapshot a cache starts with.
    taken_at: Option<Timestamp>,
}

impl Snapshot {
    /// The empty snapshot served before the first successful refresh.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a snapshot taken now.
    pub fn new(entities: Vec<Entity>) -> Self {
        Self::taken_at(entities, Utc::now())
    }

    /// Create a snapshot with an explicit capture time.
    pub fn taken_at(entities: Vec<Entity>, at: Timestamp) -> Self {
        Self {
            entities,
            taken_at: Some(at),
        }
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.entities.iter()
    }

    /// When the snapshot was fetched, if it ever was.
    pub fn captured_at(&self) -> Option<Timestamp> {
        self.taken_at
    }

    /// Time elapsed since the snapshot was fetched.
    pub fn age(&self) -> Option<Duration> {
        let taken_at = self.taken_at?;
        let now = Utc::now();
        if now > taken_at {
            Some((now - taken_at).to_std().unwrap_or(Duration::ZERO))
        } else {
            Some(Duration::ZERO)
        }
    }

    /// Look up an entity by id.
    pub fn find(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_serializes_id_and_title() -> Result<(), serde_json::Error> {
        let id = new_entity_id();
        let entity = Entity::new(id, "a");
        let json = serde_json::to_value(&entity)?;

        assert_eq!(json["id"], serde_json::json!(id.to_string()));
        assert_eq!(json["title"], "a");
        Ok(())
    }

    #[test]
    fn test_new_entity_with_id() {
        let id = new_entity_id();
        let entity = NewEntity::new("draft").with_id(id);
        assert_eq!(entity, Entity::new(id, "draft"));
    }

    #[test]
    fn test_empty_snapshot_has_no_capture_time() {
        let snapshot = Snapshot::empty();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.captured_at(), None);
        assert_eq!(snapshot.age(), None);
    }

    #[test]
    fn test_snapshot_preserves_store_order() {
        let first = Entity::new(new_entity_id(), "z");
        let second = Entity::new(new_entity_id(), "a");
        let snapshot = Snapshot::new(vec![first.clone(), second.clone()]);

        assert_eq!(snapshot.entities(), &[first, second]);
    }

    #[test]
    fn test_snapshot_age() {
        let past = Utc::now() - chrono::Duration::seconds(5);
        let snapshot = Snapshot::taken_at(Vec::new(), past);

        let age = snapshot.age().unwrap_or_default();
        assert!(age >= Duration::from_secs(4));
        assert!(age <= Duration::from_secs(10));
    }

    #[test]
    fn test_snapshot_find() {
        let wanted = Entity::new(new_entity_id(), "wanted");
        let snapshot = Snapshot::new(vec![Entity::new(new_entity_id(), "other"), wanted.clone()]);

        assert_eq!(snapshot.find(wanted.id), Some(&wanted));
        assert_eq!(snapshot.find(new_entity_id()), None);
    }
}
