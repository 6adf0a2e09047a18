//! Entity REST API Routes
//!
//! Reads are answered from the cache snapshot and never touch the store.
//! Writes go straight to the store; the refresher makes them visible to
//! `GET /` on its next tick.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use roster_storage::{EntityCache, EntityStore};

use crate::{
    error::{ApiError, ApiResult},
    extractors::{EntityPath, JsonBody},
    types::{CreateEntityRequest, UpdateEntityRequest},
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET / - List every entity in the current snapshot
pub async fn list_entities(State(cache): State<Arc<EntityCache>>) -> ApiResult<Response> {
    let snapshot = cache.read();
    let body = serde_json::to_vec(snapshot.entities()).map_err(ApiError::encoding_failed)?;

    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// POST / - Create a new entity
pub async fn create_entity(
    State(store): State<Arc<dyn EntityStore>>,
    JsonBody(req): JsonBody<CreateEntityRequest>,
) -> ApiResult<impl IntoResponse> {
    let entity = store.insert_one(req.into()).await?;

    tracing::info!(entity_id = %entity.id, "Entity created");
    Ok((StatusCode::CREATED, Json(entity)))
}

/// PUT /:id - Replace the title of an existing entity
///
/// The id is validated before the body, and both before the store is called.
pub async fn update_entity(
    State(store): State<Arc<dyn EntityStore>>,
    EntityPath(id): EntityPath,
    JsonBody(req): JsonBody<UpdateEntityRequest>,
) -> ApiResult<impl IntoResponse> {
    let entity = store.find_and_replace_one(id, req.title).await?;

    tracing::info!(entity_id = %entity.id, "Entity updated");
    Ok(Json(entity))
}
