//! Vote and comment handlers shared by issues and groups.
//!
//! Mounted under both `/issues/{id}` and `/groups/{id}`; the subject kind is
//! supplied by an [`Extension`] on each mount.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `…/{id}/vote` | Toggle the actor's vote; returns [`VoteOutcome`] |
//! | `DELETE` | `…/{id}/vote` | Remove the actor's vote if any |
//! | `GET`    | `…/{id}/comments` | Oldest first |
//! | `POST`   | `…/{id}/comments` | Body: `{"content"}`; returns 201 |
//! | `DELETE` | `/comments/{id}` | Author only; 204 |

use std::sync::Arc;

use axum::{
  Extension, Json, Router,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
  routing::{get, post},
};
use civic_core::{
  entity::Comment,
  store::CivicStore,
  subject::{SubjectKind, SubjectRef},
  vote::VoteOutcome,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{actor::Actor, error::ApiError};

/// Routes for one subject kind, to be nested under `/{kind}s/{id}`.
pub fn routes<S>(kind: SubjectKind) -> Router<Arc<S>>
where
  S: CivicStore + 'static,
{
  Router::new()
    .route("/vote", post(toggle_vote::<S>).delete(remove_vote::<S>))
    .route("/comments", get(list_comments::<S>).post(add_comment::<S>))
    .layer(Extension(kind))
}

// ─── Votes ───────────────────────────────────────────────────────────────────

/// `POST /{issues,groups}/{id}/vote`
pub async fn toggle_vote<S: CivicStore>(
  State(store): State<Arc<S>>,
  Extension(kind): Extension<SubjectKind>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<VoteOutcome>, ApiError> {
  let outcome = store
    .toggle_vote(SubjectRef { kind, id }, actor)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(outcome))
}

/// `DELETE /{issues,groups}/{id}/vote`
pub async fn remove_vote<S: CivicStore>(
  State(store): State<Arc<S>>,
  Extension(kind): Extension<SubjectKind>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<VoteOutcome>, ApiError> {
  let outcome = store
    .remove_vote(SubjectRef { kind, id }, actor)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(outcome))
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NewCommentBody {
  pub content: String,
}

/// `GET /{issues,groups}/{id}/comments`
pub async fn list_comments<S: CivicStore>(
  State(store): State<Arc<S>>,
  Extension(kind): Extension<SubjectKind>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, ApiError> {
  let comments = store
    .list_comments(SubjectRef { kind, id })
    .await
    .map_err(ApiError::store)?;
  Ok(Json(comments))
}

/// `POST /{issues,groups}/{id}/comments`
pub async fn add_comment<S: CivicStore>(
  State(store): State<Arc<S>>,
  Extension(kind): Extension<SubjectKind>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
  Json(body): Json<NewCommentBody>,
) -> Result<impl IntoResponse, ApiError> {
  let comment = store
    .add_comment(SubjectRef { kind, id }, actor, body.content)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(comment)))
}

/// `DELETE /comments/{id}`
pub async fn delete_comment<S: CivicStore>(
  State(store): State<Arc<S>>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  store.delete_comment(id, actor).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
