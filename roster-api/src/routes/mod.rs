//! REST API Routes
//!
//! | Method | Path      | Handler                          |
//! |--------|-----------|----------------------------------|
//! | GET    | `/`       | [`entity::list_entities`]        |
//! | POST   | `/`       | [`entity::create_entity`]        |
//! | PUT    | `/:id`    | [`entity::update_entity`]        |
//! | GET    | `/health` | [`health::health`]               |

use axum::{
    routing::{get, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod entity;
pub mod health;

/// Create the complete API router with request tracing.
pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(entity::list_entities).post(entity::create_entity))
        .route("/health", get(health::health))
        .route("/:id", put(entity::update_entity))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
