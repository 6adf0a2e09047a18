//! Roster Storage - Store Gateway and Entity Cache
//!
//! Defines the persistence seam ([`EntityStore`]) that the HTTP layer and the
//! refresher talk to, an in-memory implementation for tests and local runs,
//! and the [`EntityCache`] that serves every read from memory.
//!
//! The production PostgreSQL store lives in `roster-api`.

pub mod cache;
pub mod memory;
pub mod store;

pub use cache::EntityCache;
pub use memory::InMemoryEntityStore;
pub use store::{EntityStore, TimeoutStore};
