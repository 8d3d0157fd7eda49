//! Error types for `civic-core`.
//!
//! Every failure a store operation can report to its caller falls into one of
//! four buckets: something is missing ([`Error::NotFound`]), a uniqueness or
//! state precondition is violated ([`Error::Conflict`]), the actor may not
//! perform the transition ([`Error::Forbidden`]), or the input itself is bad
//! ([`Error::Invalid`]).

use thiserror::Error;
use uuid::Uuid;

/// The kind of record a [`Error::NotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Entity {
  Issue,
  Group,
  User,
  Role,
  Comment,
  JoinRequest,
  RoleChangeRequest,
}

/// A uniqueness or state precondition that an operation refused to violate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Conflict {
  #[error("voter {voter} already has a vote on {subject}")]
  DuplicateVote { subject: Uuid, voter: Uuid },

  #[error("issue {issue} already belongs to group {group}")]
  AlreadyInGroup { issue: Uuid, group: Uuid },

  #[error("a pending join request already links issue {issue} and group {group}")]
  PendingJoinRequest { issue: Uuid, group: Uuid },

  #[error("request {0} is no longer pending")]
  NotPending(Uuid),

  #[error("user {0} already has a pending role change request")]
  PendingRoleChange(Uuid),

  #[error("user {user} already holds role {role}")]
  RoleUnchanged { user: Uuid, role: Uuid },

  #[error("username {0:?} is already taken")]
  UsernameTaken(String),
}

/// Why an actor was refused a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Forbidden {
  #[error("actor owns neither the issue nor the group")]
  NotAnOwner,

  #[error("only the party that did not initiate the request may decide it")]
  NotDecider,

  #[error("only the issue owner may do this")]
  NotIssueOwner,

  #[error("only the comment author may delete it")]
  NotCommentAuthor,

  #[error("reviewer is not an administrator")]
  NotAdministrator,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("{entity} not found: {id}")]
  NotFound { entity: Entity, id: Uuid },

  #[error("conflict: {0}")]
  Conflict(#[from] Conflict),

  #[error("forbidden: {0}")]
  Forbidden(#[from] Forbidden),

  #[error("invalid input: {0}")]
  Invalid(String),

  #[error("unknown {kind} discriminant: {value:?}")]
  UnknownDiscriminant { kind: &'static str, value: String },
}

impl Error {
  pub fn not_found(entity: Entity, id: Uuid) -> Self {
    Self::NotFound { entity, id }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Implemented by backend error types so callers can tell domain failures
/// apart from infrastructure failures without knowing the backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// The domain failure behind this error, if it is one.
  fn domain(&self) -> Option<&Error>;
}

impl StoreError for Error {
  fn domain(&self) -> Option<&Error> { Some(self) }
}
