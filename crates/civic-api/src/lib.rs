//! JSON REST API for Civic.
//!
//! Exposes an axum [`Router`] backed by any [`civic_core::store::CivicStore`].
//! The acting user is read from the `X-Actor-Id` header; authenticating that
//! header is the caller's responsibility, as are TLS and transport concerns.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", civic_api::api_router(store.clone()))
//! ```

pub mod actor;
pub mod error;
pub mod issues;
pub mod maintenance;
pub mod people;
pub mod requests;
pub mod subjects;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use civic_core::{store::CivicStore, subject::SubjectKind};

pub use actor::Actor;
pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: CivicStore + 'static,
{
  Router::new()
    // Roles & users
    .route("/roles", get(people::list_roles::<S>).post(people::create_role::<S>))
    .route("/users", post(people::create_user::<S>))
    .route("/users/{id}", get(people::get_user::<S>))
    // Groups & issues
    .route("/groups", post(issues::create_group::<S>))
    .route("/groups/{id}", get(issues::get_group::<S>))
    .route("/issues", post(issues::create_issue::<S>))
    .route(
      "/issues/{id}",
      get(issues::get_issue::<S>).delete(issues::delete_issue::<S>),
    )
    .route("/issues/{id}/group", delete(issues::detach_issue::<S>))
    // Votes & comments
    .nest("/issues/{id}", subjects::routes::<S>(SubjectKind::Issue))
    .nest("/groups/{id}", subjects::routes::<S>(SubjectKind::Group))
    .route("/comments/{id}", delete(subjects::delete_comment::<S>))
    // Join requests
    .route(
      "/join-requests",
      get(requests::list_joins::<S>).post(requests::submit_join::<S>),
    )
    .route("/join-requests/{id}/decision", post(requests::decide_join::<S>))
    .route("/join-requests/{id}/cancel", post(requests::cancel_join::<S>))
    // Role change requests
    .route(
      "/role-requests",
      get(requests::list_roles::<S>).post(requests::submit_role::<S>),
    )
    .route("/role-requests/{id}/decision", post(requests::decide_role::<S>))
    // Maintenance
    .route("/maintenance/recount", post(maintenance::recount::<S>))
    .with_state(store)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use civic_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use super::*;
  use crate::actor::ACTOR_HEADER;

  async fn app() -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    api_router(Arc::new(store))
  }

  async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    actor: Option<Uuid>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
      builder = builder.header(ACTOR_HEADER, actor.to_string());
    }
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };

    let resp = app
      .clone()
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  async fn create_issue(app: &Router, owner: Uuid) -> String {
    let (status, issue) = send(
      app,
      "POST",
      "/issues",
      Some(owner),
      Some(json!({ "title": "Broken streetlight" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    issue["issue_id"].as_str().unwrap().to_owned()
  }

  async fn create_group(app: &Router, owner: Uuid) -> String {
    let (status, group) = send(
      app,
      "POST",
      "/groups",
      Some(owner),
      Some(json!({ "name": "Lighting" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    group["group_id"].as_str().unwrap().to_owned()
  }

  #[tokio::test]
  async fn missing_actor_is_unauthorized() {
    let app = app().await;
    let (status, body) = send(&app, "POST", "/groups", None, Some(json!({ "name": "x" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
  }

  #[tokio::test]
  async fn vote_toggles_on_and_off() {
    let app = app().await;
    let issue = create_issue(&app, Uuid::new_v4()).await;
    let voter = Some(Uuid::new_v4());
    let uri = format!("/issues/{issue}/vote");

    let (status, body) = send(&app, "POST", &uri, voter, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "voted": true, "count": 1 }));

    let (_, body) = send(&app, "POST", &uri, voter, None).await;
    assert_eq!(body, json!({ "voted": false, "count": 0 }));

    let (status, body) = send(&app, "DELETE", &uri, voter, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "voted": false, "count": 0 }));
  }

  #[tokio::test]
  async fn group_votes_use_group_counter() {
    let app = app().await;
    let group = create_group(&app, Uuid::new_v4()).await;

    let (status, _) = send(
      &app,
      "POST",
      &format!("/groups/{group}/vote"),
      Some(Uuid::new_v4()),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", &format!("/groups/{group}"), None, None).await;
    assert_eq!(body["upvote_count"], 1);
  }

  #[tokio::test]
  async fn vote_on_missing_issue_is_404() {
    let app = app().await;
    let uri = format!("/issues/{}/vote", Uuid::new_v4());
    let (status, body) = send(&app, "POST", &uri, Some(Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("issue"));
  }

  #[tokio::test]
  async fn join_request_round_trip() {
    let app = app().await;
    let (issue_owner, group_owner) = (Uuid::new_v4(), Uuid::new_v4());
    let issue = create_issue(&app, issue_owner).await;
    let group = create_group(&app, group_owner).await;

    let (status, req) = send(
      &app,
      "POST",
      "/join-requests",
      Some(issue_owner),
      Some(json!({ "issue_id": issue, "group_id": group })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(req["status"], "pending");
    let decision_uri = format!("/join-requests/{}/decision", req["request_id"].as_str().unwrap());

    // the initiator may not decide its own request
    let (status, _) = send(
      &app,
      "POST",
      &decision_uri,
      Some(issue_owner),
      Some(json!({ "decision": "approve" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, decided) = send(
      &app,
      "POST",
      &decision_uri,
      Some(group_owner),
      Some(json!({ "decision": "approve" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decided["status"], "approved");

    let (_, g) = send(&app, "GET", &format!("/groups/{group}"), None, None).await;
    assert_eq!(g["issue_count"], 1);

    let (status, _) = send(
      &app,
      "POST",
      "/join-requests",
      Some(issue_owner),
      Some(json!({ "issue_id": issue, "group_id": group })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, listed) = send(
      &app,
      "GET",
      &format!("/join-requests?group_id={group}&status=approved"),
      None,
      None,
    )
    .await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, detached) = send(
      &app,
      "DELETE",
      &format!("/issues/{issue}/group"),
      Some(group_owner),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(detached["group_id"].is_null());
  }

  #[tokio::test]
  async fn comments_validate_and_guard_deletion() {
    let app = app().await;
    let author = Uuid::new_v4();
    let issue = create_issue(&app, Uuid::new_v4()).await;
    let uri = format!("/issues/{issue}/comments");

    let (status, _) = send(&app, "POST", &uri, Some(author), Some(json!({ "content": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, comment) = send(
      &app,
      "POST",
      &uri,
      Some(author),
      Some(json!({ "content": "Reported to the city" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let comment_uri = format!("/comments/{}", comment["comment_id"].as_str().unwrap());

    let (_, listed) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "DELETE", &comment_uri, Some(Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "DELETE", &comment_uri, Some(author), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, issue) = send(&app, "GET", &format!("/issues/{issue}"), None, None).await;
    assert_eq!(issue["comment_count"], 0);
  }

  #[tokio::test]
  async fn role_requests_need_an_admin_reviewer() {
    let app = app().await;
    let (_, admin_role) = send(
      &app,
      "POST",
      "/roles",
      None,
      Some(json!({ "title": "Admin", "upvote_weight": 1, "is_admin": true })),
    )
    .await;
    let (_, resident) = send(
      &app,
      "POST",
      "/roles",
      None,
      Some(json!({ "title": "Resident", "upvote_weight": 1 })),
    )
    .await;
    let (_, official) = send(
      &app,
      "POST",
      "/roles",
      None,
      Some(json!({ "title": "Official", "upvote_weight": 4 })),
    )
    .await;

    let (_, admin) = send(
      &app,
      "POST",
      "/users",
      None,
      Some(json!({ "username": "root", "role_id": admin_role["role_id"] })),
    )
    .await;
    let (status, ana) = send(
      &app,
      "POST",
      "/users",
      None,
      Some(json!({ "username": "ana", "role_id": resident["role_id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let ana_id: Uuid = serde_json::from_value(ana["user_id"].clone()).unwrap();
    let admin_id: Uuid = serde_json::from_value(admin["user_id"].clone()).unwrap();

    let (status, req) = send(
      &app,
      "POST",
      "/role-requests",
      Some(ana_id),
      Some(json!({ "role_id": official["role_id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let decision_uri = format!("/role-requests/{}/decision", req["request_id"].as_str().unwrap());

    let (status, _) = send(
      &app,
      "POST",
      &decision_uri,
      Some(ana_id),
      Some(json!({ "decision": "approve" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, decided) = send(
      &app,
      "POST",
      &decision_uri,
      Some(admin_id),
      Some(json!({ "decision": "approve" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decided["status"], "approved");

    let (_, user) = send(&app, "GET", &format!("/users/{ana_id}"), None, None).await;
    assert_eq!(user["role_id"], official["role_id"]);

    let (_, pending) = send(&app, "GET", "/role-requests?status=pending", None, None).await;
    assert!(pending.as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn recount_on_clean_store_reports_nothing() {
    let app = app().await;
    create_issue(&app, Uuid::new_v4()).await;
    let (status, report) = send(&app, "POST", "/maintenance/recount", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
      report,
      json!({ "upvote_counts": 0, "comment_counts": 0, "issue_counts": 0 })
    );
  }
}
