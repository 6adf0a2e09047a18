//! Roster API - REST Layer and Cache Refresher
//!
//! Serves the entity collection over a minimal REST interface. Reads come
//! from the in-memory [`EntityCache`](roster_storage::EntityCache); writes go
//! straight to the store and become visible on the next refresh tick.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod extractors;
pub mod jobs;
pub mod macros;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use config::ServiceConfig;
pub use db::PgEntityStore;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use jobs::{RefreshConfig, RefreshMetrics, RefreshPhase, RefreshStatus, Refresher, TickOutcome};
pub use routes::create_api_router;
pub use state::AppState;
pub use types::{CreateEntityRequest, UpdateEntityRequest};
