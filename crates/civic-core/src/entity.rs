//! Entity records: roles, users, issues, groups and comments.
//!
//! Counter fields on [`Issue`] and [`Group`] are caches maintained by the
//! store's vote, comment and membership operations. They are never accepted
//! from callers; the `New*` input types leave them out on purpose.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::subject::SubjectRef;

// ─── Roles & users ───────────────────────────────────────────────────────────

/// A privilege level. `upvote_weight` is what a vote cast by a holder of this
/// role adds to a subject's `upvote_count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
  pub role_id:       Uuid,
  pub title:         String,
  pub upvote_weight: i64,
  /// Holders may review role change requests.
  pub is_admin:      bool,
}

/// Input to [`crate::store::CivicStore::add_role`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewRole {
  pub title:         String,
  pub upvote_weight: i64,
  #[serde(default)]
  pub is_admin:      bool,
}

/// A user as far as the core cares: an identity with a role assignment.
/// Credentials live with the identity provider, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:    Uuid,
  pub username:   String,
  pub role_id:    Uuid,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
  pub username: String,
  pub role_id:  Uuid,
}

// ─── Issues & groups ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
  pub issue_id:      Uuid,
  pub title:         String,
  pub description:   String,
  pub owner_id:      Uuid,
  pub group_id:      Option<Uuid>,
  pub upvote_count:  i64,
  pub comment_count: i64,
  pub posted_at:     DateTime<Utc>,
}

impl Issue {
  pub fn subject(&self) -> SubjectRef { SubjectRef::issue(self.issue_id) }
}

/// Input to [`crate::store::CivicStore::create_issue`]. A non-null `group_id`
/// counts the new issue towards that group's `issue_count` immediately.
#[derive(Debug, Clone)]
pub struct NewIssue {
  pub title:       String,
  pub description: String,
  pub owner_id:    Uuid,
  pub group_id:    Option<Uuid>,
}

impl NewIssue {
  pub fn new(owner_id: Uuid, title: impl Into<String>) -> Self {
    Self {
      title: title.into(),
      description: String::new(),
      owner_id,
      group_id: None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
  pub group_id:      Uuid,
  pub name:          String,
  pub owner_id:      Uuid,
  pub upvote_count:  i64,
  pub comment_count: i64,
  pub issue_count:   i64,
  pub created_at:    DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGroup {
  pub name:     String,
  pub owner_id: Uuid,
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id: Uuid,
  pub subject:    SubjectRef,
  pub author_id:  Uuid,
  pub content:    String,
  pub posted_at:  DateTime<Utc>,
}
