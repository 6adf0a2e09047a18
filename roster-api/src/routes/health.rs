//! Health Check Endpoint
//!
//! Reports what the service is serving without calling the store. Always
//! answers 200: an empty or stale cache is still a working service.

use std::sync::Arc;

use axum::{extract::State, Json};
use roster_core::Timestamp;
use roster_storage::EntityCache;
use serde::Serialize;

use crate::jobs::{RefreshMetricsSnapshot, RefreshPhase, RefreshStatus};

// ============================================================================
// TYPES
// ============================================================================

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub cache: CacheHealth,
    pub refresher: RefresherHealth,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheHealth {
    pub entities: usize,
    /// Absent until the first successful fetch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taken_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefresherHealth {
    pub phase: RefreshPhase,
    #[serde(flatten)]
    pub counters: RefreshMetricsSnapshot,
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /health - Cache and refresher status
pub async fn health(
    State(cache): State<Arc<EntityCache>>,
    State(refresh): State<RefreshStatus>,
    State(start_time): State<std::time::Instant>,
) -> Json<HealthResponse> {
    let snapshot = cache.read();

    Json(HealthResponse {
        cache: CacheHealth {
            entities: snapshot.len(),
            taken_at: snapshot.captured_at(),
            age_ms: snapshot.age().map(|age| age.as_millis() as u64),
        },
        refresher: RefresherHealth {
            phase: refresh.phase(),
            counters: refresh.metrics(),
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: start_time.elapsed().as_secs(),
    })
}
