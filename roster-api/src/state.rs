//! Shared application state for Axum routers.

use std::sync::Arc;

use roster_storage::{EntityCache, EntityStore};

use crate::jobs::RefreshStatus;

/// Application-wide state shared across all routes.
///
/// Handlers read entities from `cache` and send writes straight to `store`.
/// Nothing here is global; the binary builds one instance and tests build
/// their own.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    pub cache: Arc<EntityCache>,
    /// Refresher phase and counters, reported by `/health`.
    pub refresh: RefreshStatus,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(
        store: Arc<dyn EntityStore>,
        cache: Arc<EntityCache>,
        refresh: RefreshStatus,
    ) -> Self {
        Self {
            store,
            cache,
            refresh,
            start_time: std::time::Instant::now(),
        }
    }
}

// Use macro to reduce boilerplate for FromRef implementations
crate::impl_from_ref!(Arc<dyn EntityStore>, store);
crate::impl_from_ref!(Arc<EntityCache>, cache);
crate::impl_from_ref!(RefreshStatus, refresh);
crate::impl_from_ref!(std::time::Instant, start_time);
