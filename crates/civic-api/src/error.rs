//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use civic_core::StoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Conflict(String),

  #[error("{0}")]
  Forbidden(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a backend error by the domain failure behind it, if any.
  pub fn store<E: StoreError>(e: E) -> Self {
    use civic_core::Error as Domain;
    match e.domain() {
      Some(d @ Domain::NotFound { .. }) => Self::NotFound(d.to_string()),
      Some(Domain::Conflict(c)) => Self::Conflict(c.to_string()),
      Some(Domain::Forbidden(f)) => Self::Forbidden(f.to_string()),
      Some(Domain::Invalid(m)) => Self::BadRequest(m.clone()),
      Some(Domain::UnknownDiscriminant { .. }) | None => Self::Store(Box::new(e)),
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if let ApiError::Store(e) = &self {
      tracing::error!(error = %e, "store failure");
    }
    let message = match &self {
      ApiError::Store(e) => e.to_string(),
      other => other.to_string(),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use civic_core::{Conflict, Entity, Error as Domain, Forbidden};
  use uuid::Uuid;

  use super::*;

  #[test]
  fn domain_errors_map_onto_status_codes() {
    let cases = [
      (Domain::not_found(Entity::Issue, Uuid::nil()), StatusCode::NOT_FOUND),
      (Conflict::NotPending(Uuid::nil()).into(), StatusCode::CONFLICT),
      (Forbidden::NotDecider.into(), StatusCode::FORBIDDEN),
      (Domain::Invalid("empty".into()), StatusCode::BAD_REQUEST),
      (
        Domain::UnknownDiscriminant { kind: "status", value: "x".into() },
        StatusCode::INTERNAL_SERVER_ERROR,
      ),
    ];
    for (err, expected) in cases {
      assert_eq!(ApiError::store(err).status(), expected);
    }
  }
}
