//! Request payloads for the entity routes.

use roster_core::NewEntity;
use serde::{Deserialize, Serialize};

/// Body of `POST /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEntityRequest {
    pub title: String,
}

impl From<CreateEntityRequest> for NewEntity {
    fn from(req: CreateEntityRequest) -> Self {
        NewEntity::new(req.title)
    }
}

/// Body of `PUT /{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEntityRequest {
    pub title: String,
}
