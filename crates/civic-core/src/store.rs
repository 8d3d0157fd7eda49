//! The `CivicStore` trait and supporting types.
//!
//! The trait is implemented by storage backends (e.g. `civic-store-sqlite`).
//! Higher layers (`civic-api`, `civic-server`) depend on this abstraction, not
//! on any concrete backend.
//!
//! No method adjusts a counter directly. Counters
//! move only as part of the operation that changes the rows they summarise,
//! inside the same transaction, or during [`CivicStore::recount_counters`].

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  StoreError,
  entity::{Comment, Group, Issue, NewGroup, NewIssue, NewRole, NewUser, Role, User},
  request::{
    GroupJoinRequest, JoinDecision, JoinRequestQuery, RoleChangeRequest, RoleDecision,
    RoleRequestStatus,
  },
  subject::SubjectRef,
  vote::{Vote, VoteOutcome},
};

/// How many rows [`CivicStore::recount_counters`] had to correct, per counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecountReport {
  pub upvote_counts:  usize,
  pub comment_counts: usize,
  pub issue_counts:   usize,
}

impl RecountReport {
  pub fn total(&self) -> usize {
    self.upvote_counts + self.comment_counts + self.issue_counts
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Civic store backend.
///
/// Every mutating method is one atomic unit: either all of its row and counter
/// changes become visible together, or none do. Domain failures are reported
/// through [`StoreError::domain`].
pub trait CivicStore: Send + Sync {
  type Error: StoreError;

  // ── Roles & users ─────────────────────────────────────────────────────

  /// Create a role. Fails `Invalid` if `upvote_weight < 1`.
  fn add_role(
    &self,
    input: NewRole,
  ) -> impl Future<Output = Result<Role, Self::Error>> + Send + '_;

  fn get_role(
    &self,
    role_id: Uuid,
  ) -> impl Future<Output = Result<Option<Role>, Self::Error>> + Send + '_;

  fn list_roles(&self) -> impl Future<Output = Result<Vec<Role>, Self::Error>> + Send + '_;

  /// Register a user under an existing role.
  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  // ── Issues & groups ───────────────────────────────────────────────────

  fn create_group(
    &self,
    input: NewGroup,
  ) -> impl Future<Output = Result<Group, Self::Error>> + Send + '_;

  fn get_group(
    &self,
    group_id: Uuid,
  ) -> impl Future<Output = Result<Option<Group>, Self::Error>> + Send + '_;

  /// Create an issue. If `input.group_id` is set the group must exist and its
  /// `issue_count` is incremented in the same transaction.
  fn create_issue(
    &self,
    input: NewIssue,
  ) -> impl Future<Output = Result<Issue, Self::Error>> + Send + '_;

  fn get_issue(
    &self,
    issue_id: Uuid,
  ) -> impl Future<Output = Result<Option<Issue>, Self::Error>> + Send + '_;

  /// Delete an issue along with its votes, comments and join requests,
  /// releasing its slot in its group's `issue_count`. Owner only.
  fn delete_issue(
    &self,
    issue_id: Uuid,
    actor_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Membership counter ────────────────────────────────────────────────

  /// Point `issue_id` at `group_id` (or at no group), moving one unit of
  /// `issue_count` from the old group to the new one.
  fn reassign_issue_group(
    &self,
    issue_id: Uuid,
    group_id: Option<Uuid>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Take an issue out of its current group on behalf of either the issue
  /// owner or that group's owner. A no-op for an issue with no group.
  fn detach_issue(
    &self,
    issue_id: Uuid,
    actor_id: Uuid,
  ) -> impl Future<Output = Result<Issue, Self::Error>> + Send + '_;

  // ── Vote ledger ───────────────────────────────────────────────────────

  /// Add the voter's vote if absent, remove it if present.
  ///
  /// A new vote is weighted by the voter's current role; a removed vote takes
  /// away exactly the weight it was cast with.
  fn toggle_vote(
    &self,
    subject: SubjectRef,
    voter_id: Uuid,
  ) -> impl Future<Output = Result<VoteOutcome, Self::Error>> + Send + '_;

  /// Remove the voter's vote if there is one; otherwise leave everything as is.
  fn remove_vote(
    &self,
    subject: SubjectRef,
    voter_id: Uuid,
  ) -> impl Future<Output = Result<VoteOutcome, Self::Error>> + Send + '_;

  fn get_vote(
    &self,
    subject: SubjectRef,
    voter_id: Uuid,
  ) -> impl Future<Output = Result<Option<Vote>, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  /// Post a comment. Content is trimmed and must not be empty.
  fn add_comment(
    &self,
    subject: SubjectRef,
    author_id: Uuid,
    content: String,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  /// Delete a comment. Author only.
  fn delete_comment(
    &self,
    comment_id: Uuid,
    actor_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Comments on a subject, oldest first.
  fn list_comments(
    &self,
    subject: SubjectRef,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;

  // ── Group join requests ───────────────────────────────────────────────

  /// Propose linking `issue_id` to `group_id`.
  ///
  /// Fails, in order: `NotFound` (issue or group), `Forbidden` (actor owns
  /// neither), `Conflict` (already linked), `Conflict` (a pending request for
  /// the pair exists). When the actor owns both sides the request is created
  /// already approved and the issue is moved at once.
  fn submit_join_request(
    &self,
    issue_id: Uuid,
    group_id: Uuid,
    actor_id: Uuid,
  ) -> impl Future<Output = Result<GroupJoinRequest, Self::Error>> + Send + '_;

  /// Approve or decline a pending request. Only the non-initiating party may
  /// decide; approval moves the issue into the group atomically.
  fn decide_join_request(
    &self,
    request_id: Uuid,
    actor_id: Uuid,
    decision: JoinDecision,
  ) -> impl Future<Output = Result<GroupJoinRequest, Self::Error>> + Send + '_;

  /// Withdraw a pending request. Either owner may cancel.
  fn cancel_join_request(
    &self,
    request_id: Uuid,
    actor_id: Uuid,
  ) -> impl Future<Output = Result<GroupJoinRequest, Self::Error>> + Send + '_;

  fn get_join_request(
    &self,
    request_id: Uuid,
  ) -> impl Future<Output = Result<Option<GroupJoinRequest>, Self::Error>> + Send + '_;

  /// Join requests matching `query`, newest first.
  fn list_join_requests<'a>(
    &'a self,
    query: &'a JoinRequestQuery,
  ) -> impl Future<Output = Result<Vec<GroupJoinRequest>, Self::Error>> + Send + 'a;

  // ── Role change requests ──────────────────────────────────────────────

  /// Ask for `role_id`. Fails `Conflict` while another request from the same
  /// user is pending or if the user already holds the role.
  fn submit_role_change_request(
    &self,
    user_id: Uuid,
    role_id: Uuid,
  ) -> impl Future<Output = Result<RoleChangeRequest, Self::Error>> + Send + '_;

  /// Approve or reject a pending request. The reviewer must hold an admin
  /// role; approval reassigns the user's role in the same transaction.
  fn decide_role_change_request(
    &self,
    request_id: Uuid,
    reviewer_id: Uuid,
    decision: RoleDecision,
  ) -> impl Future<Output = Result<RoleChangeRequest, Self::Error>> + Send + '_;

  /// Role change requests, optionally filtered by status, oldest first.
  fn list_role_change_requests(
    &self,
    status: Option<RoleRequestStatus>,
  ) -> impl Future<Output = Result<Vec<RoleChangeRequest>, Self::Error>> + Send + '_;

  // ── Maintenance ───────────────────────────────────────────────────────

  /// Recompute every denormalized counter from the rows it summarises and
  /// overwrite the ones that drifted.
  fn recount_counters(
    &self,
  ) -> impl Future<Output = Result<RecountReport, Self::Error>> + Send + '_;
}
