//! Handlers for `/join-requests` and `/role-requests`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/join-requests` | Body: `{"issue_id","group_id"}`; 201 |
//! | `GET`  | `/join-requests` | `?issue_id`, `?group_id`, `?status` filters |
//! | `POST` | `/join-requests/{id}/decision` | Body: `{"decision":"approve"\|"decline"}` |
//! | `POST` | `/join-requests/{id}/cancel` | Either owner |
//! | `POST` | `/role-requests` | Body: `{"role_id"}`; the actor is the requester |
//! | `GET`  | `/role-requests` | `?status` filter |
//! | `POST` | `/role-requests/{id}/decision` | Body: `{"decision":"approve"\|"reject"}`; admins only |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use civic_core::{
  request::{
    GroupJoinRequest, JoinDecision, JoinRequestQuery, RoleChangeRequest, RoleDecision,
    RoleRequestStatus,
  },
  store::CivicStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{actor::Actor, error::ApiError};

// ─── Group join requests ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct JoinRequestBody {
  pub issue_id: Uuid,
  pub group_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct DecisionBody<D> {
  pub decision: D,
}

/// `POST /join-requests`. A self-link comes back already approved.
pub async fn submit_join<S: CivicStore>(
  State(store): State<Arc<S>>,
  Actor(actor): Actor,
  Json(body): Json<JoinRequestBody>,
) -> Result<impl IntoResponse, ApiError> {
  let request = store
    .submit_join_request(body.issue_id, body.group_id, actor)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(request)))
}

/// `GET /join-requests`
pub async fn list_joins<S: CivicStore>(
  State(store): State<Arc<S>>,
  Query(query): Query<JoinRequestQuery>,
) -> Result<Json<Vec<GroupJoinRequest>>, ApiError> {
  let requests = store
    .list_join_requests(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(requests))
}

/// `POST /join-requests/{id}/decision`
pub async fn decide_join<S: CivicStore>(
  State(store): State<Arc<S>>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
  Json(body): Json<DecisionBody<JoinDecision>>,
) -> Result<Json<GroupJoinRequest>, ApiError> {
  let request = store
    .decide_join_request(id, actor, body.decision)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(request))
}

/// `POST /join-requests/{id}/cancel`
pub async fn cancel_join<S: CivicStore>(
  State(store): State<Arc<S>>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<GroupJoinRequest>, ApiError> {
  let request = store
    .cancel_join_request(id, actor)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(request))
}

// ─── Role change requests ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RoleRequestBody {
  pub role_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct RoleListParams {
  pub status: Option<RoleRequestStatus>,
}

/// `POST /role-requests`
pub async fn submit_role<S: CivicStore>(
  State(store): State<Arc<S>>,
  Actor(actor): Actor,
  Json(body): Json<RoleRequestBody>,
) -> Result<impl IntoResponse, ApiError> {
  let request = store
    .submit_role_change_request(actor, body.role_id)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(request)))
}

/// `GET /role-requests`
pub async fn list_roles<S: CivicStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<RoleListParams>,
) -> Result<Json<Vec<RoleChangeRequest>>, ApiError> {
  let requests = store
    .list_role_change_requests(params.status)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(requests))
}

/// `POST /role-requests/{id}/decision`
pub async fn decide_role<S: CivicStore>(
  State(store): State<Arc<S>>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
  Json(body): Json<DecisionBody<RoleDecision>>,
) -> Result<Json<RoleChangeRequest>, ApiError> {
  let request = store
    .decide_role_change_request(id, actor, body.decision)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(request))
}
