//! Handlers for `/roles` and `/users`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/roles` | All roles, lightest first |
//! | `POST` | `/roles` | Body: [`NewRole`]; returns 201 |
//! | `POST` | `/users` | Body: [`NewUser`]; returns 201 |
//! | `GET`  | `/users/{id}` | Single user |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use civic_core::{
  entity::{NewRole, NewUser, Role, User},
  store::CivicStore,
};
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /roles`
pub async fn list_roles<S: CivicStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Role>>, ApiError> {
  let roles = store.list_roles().await.map_err(ApiError::store)?;
  Ok(Json(roles))
}

/// `POST /roles`
pub async fn create_role<S: CivicStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewRole>,
) -> Result<impl IntoResponse, ApiError> {
  let role = store.add_role(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(role)))
}

/// `POST /users`
pub async fn create_user<S: CivicStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewUser>,
) -> Result<impl IntoResponse, ApiError> {
  let user = store.add_user(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /users/{id}`
pub async fn get_user<S: CivicStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
  store
    .get_user(id)
    .await
    .map_err(ApiError::store)?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("user not found: {id}")))
}
