//! `X-Actor-Id` extractor.
//!
//! Identity is established upstream; this layer only trusts the header and
//! parses it as a user id.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use uuid::Uuid;

use crate::error::ApiError;

pub const ACTOR_HEADER: &str = "x-actor-id";

/// The user on whose behalf the request acts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor(pub Uuid);

/// Read the actor id from headers.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, ApiError> {
  let raw = headers
    .get(ACTOR_HEADER)
    .ok_or_else(|| ApiError::Unauthorized(format!("missing {ACTOR_HEADER} header")))?
    .to_str()
    .map_err(|_| ApiError::Unauthorized(format!("{ACTOR_HEADER} is not valid text")))?;

  Uuid::parse_str(raw.trim())
    .map(Actor)
    .map_err(|_| ApiError::Unauthorized(format!("{ACTOR_HEADER} is not a UUID")))
}

impl<S> FromRequestParts<S> for Actor
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    actor_from_headers(&parts.headers)
  }
}

#[cfg(test)]
mod tests {
  use axum::{body::Body, http::Request};

  use super::*;

  async fn extract(req: Request<Body>) -> Result<Actor, ApiError> {
    let (mut parts, _) = req.into_parts();
    Actor::from_request_parts(&mut parts, &()).await
  }

  #[tokio::test]
  async fn valid_header() {
    let id = Uuid::new_v4();
    let req = Request::builder()
      .header(ACTOR_HEADER, id.to_string())
      .body(Body::empty())
      .unwrap();
    assert_eq!(extract(req).await.unwrap(), Actor(id));
  }

  #[tokio::test]
  async fn missing_header() {
    let req = Request::builder().body(Body::empty()).unwrap();
    assert!(matches!(extract(req).await, Err(ApiError::Unauthorized(_))));
  }

  #[tokio::test]
  async fn malformed_header() {
    let req = Request::builder()
      .header(ACTOR_HEADER, "not-a-uuid")
      .body(Body::empty())
      .unwrap();
    assert!(matches!(extract(req).await, Err(ApiError::Unauthorized(_))));
  }
}
