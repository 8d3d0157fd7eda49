//! Handlers for `/groups` and `/issues`.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/groups` | Body: `{"name"}`; actor becomes owner |
//! | `GET`    | `/groups/{id}` | |
//! | `POST`   | `/issues` | Body: `{"title","description"?}`; actor becomes owner |
//! | `GET`    | `/issues/{id}` | |
//! | `DELETE` | `/issues/{id}` | Issue owner only; 204 |
//! | `DELETE` | `/issues/{id}/group` | Either owner; returns the detached issue |
//!
//! Issues join groups only through `/join-requests`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use civic_core::{
  entity::{Group, Issue, NewGroup, NewIssue},
  store::CivicStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{actor::Actor, error::ApiError};

// ─── Groups ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NewGroupBody {
  pub name: String,
}

/// `POST /groups`
pub async fn create_group<S: CivicStore>(
  State(store): State<Arc<S>>,
  Actor(actor): Actor,
  Json(body): Json<NewGroupBody>,
) -> Result<impl IntoResponse, ApiError> {
  let group = store
    .create_group(NewGroup { name: body.name, owner_id: actor })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(group)))
}

/// `GET /groups/{id}`
pub async fn get_group<S: CivicStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Group>, ApiError> {
  store
    .get_group(id)
    .await
    .map_err(ApiError::store)?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("group not found: {id}")))
}

// ─── Issues ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NewIssueBody {
  pub title:       String,
  #[serde(default)]
  pub description: String,
}

/// `POST /issues`
pub async fn create_issue<S: CivicStore>(
  State(store): State<Arc<S>>,
  Actor(actor): Actor,
  Json(body): Json<NewIssueBody>,
) -> Result<impl IntoResponse, ApiError> {
  let mut input = NewIssue::new(actor, body.title);
  input.description = body.description;
  let issue = store.create_issue(input).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(issue)))
}

/// `GET /issues/{id}`
pub async fn get_issue<S: CivicStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Issue>, ApiError> {
  store
    .get_issue(id)
    .await
    .map_err(ApiError::store)?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("issue not found: {id}")))
}

/// `DELETE /issues/{id}`
pub async fn delete_issue<S: CivicStore>(
  State(store): State<Arc<S>>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  store.delete_issue(id, actor).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /issues/{id}/group`
pub async fn detach_issue<S: CivicStore>(
  State(store): State<Arc<S>>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<Issue>, ApiError> {
  let issue = store.detach_issue(id, actor).await.map_err(ApiError::store)?;
  Ok(Json(issue))
}
