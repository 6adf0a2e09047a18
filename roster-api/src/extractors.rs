//! Extractors that reject malformed requests with [`ApiError`].
//!
//! Axum's stock `Json` and `Path` rejections use a mix of 400, 415 and 422
//! with plain-text bodies. Every malformed body or id here is a 400 with the
//! usual JSON error body, and is rejected before any store call.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Json, Path, Request},
    http::request::Parts,
};
use roster_core::EntityId;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON request body. The body must be a JSON object; arrays and scalars
/// are rejected even when `T` could be deserialized from them.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<serde_json::Value>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::invalid_input(rejection.body_text()))?;

        if !value.is_object() {
            return Err(ApiError::invalid_input("Request body must be a JSON object"));
        }

        let body = serde_json::from_value(value)
            .map_err(|e| ApiError::invalid_input(format!("Invalid request body: {}", e)))?;
        Ok(Self(body))
    }
}

/// Entity id taken from the single path parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityPath(pub EntityId);

#[async_trait]
impl<S> FromRequestParts<S> for EntityPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::invalid_input(rejection.body_text()))?;

        let id = EntityId::parse_str(&raw).map_err(|e| {
            ApiError::from(e).with_details(serde_json::json!({ "path_param": raw }))
        })?;
        Ok(Self(id))
    }
}
