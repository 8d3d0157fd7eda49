//! [`SqliteStore`], the SQLite implementation of [`CivicStore`].

use std::path::Path;

use chrono::{DateTime, SubsecRound as _, Utc};
use civic_core::{
  Conflict, Entity, Error as CoreError,
  entity::{Comment, Group, Issue, NewGroup, NewIssue, NewRole, NewUser, Role, User},
  policy::{self, Ownership},
  request::{
    GroupJoinRequest, JoinDecision, JoinRequestQuery, JoinRequestStatus, RoleChangeRequest,
    RoleDecision, RoleRequestStatus,
  },
  store::{CivicStore, RecountReport},
  subject::{SubjectKind, SubjectRef},
  vote::{self as ballot, Vote, VoteOutcome},
};
use rusqlite::{Connection, OptionalExtension as _, Transaction, TransactionBehavior};
use uuid::Uuid;

use crate::{
  Result,
  counters::{Counter, on_constraint},
  encode::{
    COMMENT_COLUMNS, GROUP_COLUMNS, ISSUE_COLUMNS, JOIN_REQUEST_COLUMNS, ROLE_COLUMNS,
    ROLE_REQUEST_COLUMNS, RawComment, RawGroup, RawIssue, RawJoinRequest, RawRole,
    RawRoleRequest, RawUser, RawVote, USER_COLUMNS, VOTE_COLUMNS, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Civic store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All clones
/// share one connection thread, so operations from concurrent tasks are
/// applied one transaction at a time.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `op` inside one IMMEDIATE transaction on the connection thread.
  ///
  /// The write lock is taken before `op` reads anything, so no other writer
  /// can interleave between its checks and its writes. The transaction
  /// commits only if `op` returns `Ok`; otherwise it is rolled back on drop.
  async fn write<T, F>(&self, op: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Transaction<'_>) -> Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let outcome = op(&tx);
        if outcome.is_ok() {
          tx.commit()?;
        }
        Ok(outcome)
      })
      .await?
  }

  /// Run a read-only `op` on the connection thread.
  async fn read<T, F>(&self, op: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
  {
    self.conn.call(move |conn| Ok(op(conn))).await?
  }

  /// Overwrite a counter directly, bypassing the ledger. Only tests use this,
  /// to simulate drift.
  #[cfg(test)]
  pub(crate) async fn overwrite_counter(
    &self,
    counter: Counter,
    id: Uuid,
    value: i64,
  ) -> Result<()> {
    self.write(move |tx| counter.set(tx, id, value)).await
  }
}

/// The current time at the precision timestamps are stored with, so a record
/// returned from a write equals the same record read back later.
fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

// ─── Row lookups (run inside a transaction or read closure) ──────────────────

fn fetch_role(conn: &Connection, id: Uuid) -> Result<Option<Role>> {
  let sql = format!("SELECT {ROLE_COLUMNS} FROM roles WHERE role_id = ?1");
  conn
    .query_row(&sql, [encode_uuid(id)], RawRole::from_row)
    .optional()?
    .map(RawRole::into_role)
    .transpose()
}

fn fetch_user(conn: &Connection, id: Uuid) -> Result<Option<User>> {
  let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1");
  conn
    .query_row(&sql, [encode_uuid(id)], RawUser::from_row)
    .optional()?
    .map(RawUser::into_user)
    .transpose()
}

fn fetch_group(conn: &Connection, id: Uuid) -> Result<Option<Group>> {
  let sql = format!("SELECT {GROUP_COLUMNS} FROM issue_groups WHERE group_id = ?1");
  conn
    .query_row(&sql, [encode_uuid(id)], RawGroup::from_row)
    .optional()?
    .map(RawGroup::into_group)
    .transpose()
}

fn fetch_issue(conn: &Connection, id: Uuid) -> Result<Option<Issue>> {
  let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE issue_id = ?1");
  conn
    .query_row(&sql, [encode_uuid(id)], RawIssue::from_row)
    .optional()?
    .map(RawIssue::into_issue)
    .transpose()
}

fn fetch_join_request(conn: &Connection, id: Uuid) -> Result<Option<GroupJoinRequest>> {
  let sql =
    format!("SELECT {JOIN_REQUEST_COLUMNS} FROM group_join_requests WHERE request_id = ?1");
  conn
    .query_row(&sql, [encode_uuid(id)], RawJoinRequest::from_row)
    .optional()?
    .map(RawJoinRequest::into_request)
    .transpose()
}

fn fetch_role_request(conn: &Connection, id: Uuid) -> Result<Option<RoleChangeRequest>> {
  let sql =
    format!("SELECT {ROLE_REQUEST_COLUMNS} FROM role_change_requests WHERE request_id = ?1");
  conn
    .query_row(&sql, [encode_uuid(id)], RawRoleRequest::from_row)
    .optional()?
    .map(RawRoleRequest::into_request)
    .transpose()
}

fn fetch_vote(conn: &Connection, subject: SubjectRef, voter_id: Uuid) -> Result<Option<Vote>> {
  let sql = format!(
    "SELECT {VOTE_COLUMNS} FROM votes
     WHERE subject_kind = ?1 AND subject_id = ?2 AND voter_id = ?3"
  );
  conn
    .query_row(
      &sql,
      rusqlite::params![
        subject.kind.as_str(),
        encode_uuid(subject.id),
        encode_uuid(voter_id)
      ],
      RawVote::from_row,
    )
    .optional()?
    .map(RawVote::into_vote)
    .transpose()
}

/// Turn a missing row into `NotFound`.
fn require<T>(found: Option<T>, entity: Entity, id: Uuid) -> Result<T> {
  found.ok_or_else(|| CoreError::not_found(entity, id).into())
}

/// The two owners a join request or membership change sits between.
fn ownership(conn: &Connection, issue: &Issue, group_id: Uuid) -> Result<Ownership> {
  let group = require(fetch_group(conn, group_id)?, Entity::Group, group_id)?;
  Ok(Ownership {
    issue_owner: issue.owner_id,
    group_owner: group.owner_id,
  })
}

// ─── Ledger and membership steps ─────────────────────────────────────────────

/// The weight a vote cast now by `voter_id` carries: the voter's current role
/// weight, or the fallback when the voter or role cannot be resolved.
fn voter_weight(conn: &Connection, voter_id: Uuid) -> Result<i64> {
  let looked_up: Option<Option<i64>> = conn
    .query_row(
      "SELECT r.upvote_weight
       FROM users u
       LEFT JOIN roles r ON r.role_id = u.role_id
       WHERE u.user_id = ?1",
      [encode_uuid(voter_id)],
      |r| r.get(0),
    )
    .optional()?;

  match looked_up {
    Some(Some(weight)) => Ok(ballot::effective_weight(Some(weight))),
    Some(None) => {
      tracing::warn!(%voter_id, "voter's role does not resolve; using fallback weight");
      Ok(ballot::FALLBACK_WEIGHT)
    }
    None => {
      tracing::warn!(%voter_id, "voter is not registered; using fallback weight");
      Ok(ballot::FALLBACK_WEIGHT)
    }
  }
}

/// Delete the voter's vote if present and take its stored weight off the
/// subject. Returns the subject's count afterwards and whether a vote existed.
fn withdraw_vote(conn: &Connection, subject: SubjectRef, voter_id: Uuid) -> Result<(bool, i64)> {
  let counter = Counter::upvotes(subject.kind);
  let current = counter.get(conn, subject.id)?;

  let Some(vote) = fetch_vote(conn, subject, voter_id)? else {
    return Ok((false, current));
  };

  conn.execute(
    "DELETE FROM votes WHERE subject_kind = ?1 AND subject_id = ?2 AND voter_id = ?3",
    rusqlite::params![
      subject.kind.as_str(),
      encode_uuid(subject.id),
      encode_uuid(voter_id)
    ],
  )?;
  let count = counter.lower(conn, subject.id, vote.weight)?;
  Ok((true, count))
}

/// Point an issue at `new_group`, moving one unit of `issue_count` from its
/// old group to the new one. Returns the issue's previous group.
fn move_issue(conn: &Connection, issue_id: Uuid, new_group: Option<Uuid>) -> Result<Option<Uuid>> {
  let issue = require(fetch_issue(conn, issue_id)?, Entity::Issue, issue_id)?;
  let old_group = issue.group_id;
  if old_group == new_group {
    return Ok(old_group);
  }

  if let Some(group_id) = new_group {
    Counter::ISSUES_IN_GROUP.raise(conn, group_id, 1)?;
  }
  if let Some(group_id) = old_group {
    Counter::ISSUES_IN_GROUP.lower(conn, group_id, 1)?;
  }

  conn.execute(
    "UPDATE issues SET group_id = ?1 WHERE issue_id = ?2",
    rusqlite::params![new_group.map(encode_uuid), encode_uuid(issue_id)],
  )?;

  tracing::debug!(%issue_id, ?old_group, ?new_group, "issue reassigned");
  Ok(old_group)
}

fn finish_join_request(
  conn: &Connection,
  request: &mut GroupJoinRequest,
  status: JoinRequestStatus,
) -> Result<()> {
  let handled_at = now();
  conn.execute(
    "UPDATE group_join_requests SET status = ?1, handled_at = ?2 WHERE request_id = ?3",
    rusqlite::params![status.as_str(), encode_dt(handled_at), encode_uuid(request.request_id)],
  )?;
  request.status = status;
  request.handled_at = Some(handled_at);
  Ok(())
}

/// Load a join request that must still be pending, with the owners on both
/// sides of it.
fn pending_join_request(
  conn: &Connection,
  request_id: Uuid,
) -> Result<(GroupJoinRequest, Ownership)> {
  let request = require(
    fetch_join_request(conn, request_id)?,
    Entity::JoinRequest,
    request_id,
  )?;
  if !request.status.is_pending() {
    return Err(Conflict::NotPending(request_id).into());
  }
  let issue = require(fetch_issue(conn, request.issue_id)?, Entity::Issue, request.issue_id)?;
  let owners = ownership(conn, &issue, request.group_id)?;
  Ok((request, owners))
}

// ─── CivicStore impl ─────────────────────────────────────────────────────────

impl CivicStore for SqliteStore {
  type Error = crate::Error;

  // ── Roles & users ─────────────────────────────────────────────────────────

  async fn add_role(&self, input: NewRole) -> Result<Role> {
    let role = Role {
      role_id:       Uuid::new_v4(),
      title:         input.title,
      upvote_weight: policy::role_weight(input.upvote_weight)?,
      is_admin:      input.is_admin,
    };

    let row = role.clone();
    self
      .write(move |tx| {
        tx.execute(
          "INSERT INTO roles (role_id, title, upvote_weight, is_admin) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![encode_uuid(row.role_id), row.title, row.upvote_weight, row.is_admin],
        )?;
        Ok(())
      })
      .await?;

    Ok(role)
  }

  async fn get_role(&self, role_id: Uuid) -> Result<Option<Role>> {
    self.read(move |conn| fetch_role(conn, role_id)).await
  }

  async fn list_roles(&self) -> Result<Vec<Role>> {
    self
      .read(|conn| {
        let sql = format!("SELECT {ROLE_COLUMNS} FROM roles ORDER BY upvote_weight, title");
        let mut stmt = conn.prepare(&sql)?;
        let raws = stmt
          .query_map([], RawRole::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        raws.into_iter().map(RawRole::into_role).collect()
      })
      .await
  }

  async fn add_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      user_id:    Uuid::new_v4(),
      username:   input.username,
      role_id:    input.role_id,
      created_at: now(),
    };

    let row = user.clone();
    self
      .write(move |tx| {
        require(fetch_role(tx, row.role_id)?, Entity::Role, row.role_id)?;
        tx.execute(
          "INSERT INTO users (user_id, username, role_id, created_at) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![
            encode_uuid(row.user_id),
            row.username,
            encode_uuid(row.role_id),
            encode_dt(row.created_at)
          ],
        )
        .map_err(|e| on_constraint(e, Conflict::UsernameTaken(row.username.clone())))?;
        Ok(())
      })
      .await?;

    Ok(user)
  }

  async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
    self.read(move |conn| fetch_user(conn, user_id)).await
  }

  // ── Issues & groups ───────────────────────────────────────────────────────

  async fn create_group(&self, input: NewGroup) -> Result<Group> {
    let group = Group {
      group_id:      Uuid::new_v4(),
      name:          input.name,
      owner_id:      input.owner_id,
      upvote_count:  0,
      comment_count: 0,
      issue_count:   0,
      created_at:    now(),
    };

    let row = group.clone();
    self
      .write(move |tx| {
        tx.execute(
          "INSERT INTO issue_groups (group_id, name, owner_id, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![
            encode_uuid(row.group_id),
            row.name,
            encode_uuid(row.owner_id),
            encode_dt(row.created_at)
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(group)
  }

  async fn get_group(&self, group_id: Uuid) -> Result<Option<Group>> {
    self.read(move |conn| fetch_group(conn, group_id)).await
  }

  async fn create_issue(&self, input: NewIssue) -> Result<Issue> {
    let issue = Issue {
      issue_id:      Uuid::new_v4(),
      title:         input.title,
      description:   input.description,
      owner_id:      input.owner_id,
      group_id:      input.group_id,
      upvote_count:  0,
      comment_count: 0,
      posted_at:     now(),
    };

    let row = issue.clone();
    self
      .write(move |tx| {
        // Only the increment half of a reassignment applies to a new issue.
        if let Some(group_id) = row.group_id {
          Counter::ISSUES_IN_GROUP.raise(tx, group_id, 1)?;
        }
        tx.execute(
          "INSERT INTO issues (issue_id, title, description, owner_id, group_id, posted_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            encode_uuid(row.issue_id),
            row.title,
            row.description,
            encode_uuid(row.owner_id),
            row.group_id.map(encode_uuid),
            encode_dt(row.posted_at)
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(issue)
  }

  async fn get_issue(&self, issue_id: Uuid) -> Result<Option<Issue>> {
    self.read(move |conn| fetch_issue(conn, issue_id)).await
  }

  async fn delete_issue(&self, issue_id: Uuid, actor_id: Uuid) -> Result<()> {
    self
      .write(move |tx| {
        let issue = require(fetch_issue(tx, issue_id)?, Entity::Issue, issue_id)?;
        policy::can_delete_issue(actor_id, issue.owner_id)?;

        move_issue(tx, issue_id, None)?;

        let subject = issue.subject();
        let id = encode_uuid(subject.id);
        let kind = subject.kind.as_str();
        tx.execute(
          "DELETE FROM votes WHERE subject_kind = ?1 AND subject_id = ?2",
          rusqlite::params![kind, id],
        )?;
        tx.execute(
          "DELETE FROM comments WHERE subject_kind = ?1 AND subject_id = ?2",
          rusqlite::params![kind, id],
        )?;
        tx.execute("DELETE FROM group_join_requests WHERE issue_id = ?1", [&id])?;
        tx.execute("DELETE FROM issues WHERE issue_id = ?1", [&id])?;

        tracing::debug!(%issue_id, %actor_id, "issue deleted");
        Ok(())
      })
      .await
  }

  // ── Membership counter ────────────────────────────────────────────────────

  async fn reassign_issue_group(&self, issue_id: Uuid, group_id: Option<Uuid>) -> Result<()> {
    self
      .write(move |tx| {
        move_issue(tx, issue_id, group_id)?;
        Ok(())
      })
      .await
  }

  async fn detach_issue(&self, issue_id: Uuid, actor_id: Uuid) -> Result<Issue> {
    self
      .write(move |tx| {
        let mut issue = require(fetch_issue(tx, issue_id)?, Entity::Issue, issue_id)?;
        let Some(group_id) = issue.group_id else {
          return Ok(issue);
        };

        let owners = ownership(tx, &issue, group_id)?;
        policy::can_detach_issue(actor_id, &owners)?;

        move_issue(tx, issue_id, None)?;
        issue.group_id = None;
        Ok(issue)
      })
      .await
  }

  // ── Vote ledger ───────────────────────────────────────────────────────────

  async fn toggle_vote(&self, subject: SubjectRef, voter_id: Uuid) -> Result<VoteOutcome> {
    self
      .write(move |tx| {
        let (removed, count) = withdraw_vote(tx, subject, voter_id)?;
        if removed {
          tracing::debug!(%subject, %voter_id, count, "vote withdrawn");
          return Ok(VoteOutcome { voted: false, count });
        }

        let weight = voter_weight(tx, voter_id)?;
        tx.execute(
          "INSERT INTO votes (subject_kind, subject_id, voter_id, weight, cast_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            subject.kind.as_str(),
            encode_uuid(subject.id),
            encode_uuid(voter_id),
            weight,
            encode_dt(now())
          ],
        )
        .map_err(|e| {
          on_constraint(e, Conflict::DuplicateVote {
            subject: subject.id,
            voter:   voter_id,
          })
        })?;
        let count = Counter::upvotes(subject.kind).raise(tx, subject.id, weight)?;

        tracing::debug!(%subject, %voter_id, weight, count, "vote cast");
        Ok(VoteOutcome { voted: true, count })
      })
      .await
  }

  async fn remove_vote(&self, subject: SubjectRef, voter_id: Uuid) -> Result<VoteOutcome> {
    self
      .write(move |tx| {
        let (_, count) = withdraw_vote(tx, subject, voter_id)?;
        Ok(VoteOutcome { voted: false, count })
      })
      .await
  }

  async fn get_vote(&self, subject: SubjectRef, voter_id: Uuid) -> Result<Option<Vote>> {
    self.read(move |conn| fetch_vote(conn, subject, voter_id)).await
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn add_comment(
    &self,
    subject: SubjectRef,
    author_id: Uuid,
    content: String,
  ) -> Result<Comment> {
    let comment = Comment {
      comment_id: Uuid::new_v4(),
      subject,
      author_id,
      content: policy::comment_content(&content)?.to_owned(),
      posted_at: now(),
    };

    let row = comment.clone();
    self
      .write(move |tx| {
        Counter::comments(subject.kind).raise(tx, subject.id, 1)?;
        tx.execute(
          "INSERT INTO comments (comment_id, subject_kind, subject_id, author_id, content, posted_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            encode_uuid(row.comment_id),
            row.subject.kind.as_str(),
            encode_uuid(row.subject.id),
            encode_uuid(row.author_id),
            row.content,
            encode_dt(row.posted_at)
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(comment)
  }

  async fn delete_comment(&self, comment_id: Uuid, actor_id: Uuid) -> Result<()> {
    self
      .write(move |tx| {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE comment_id = ?1");
        let raw = tx
          .query_row(&sql, [encode_uuid(comment_id)], RawComment::from_row)
          .optional()?;
        let comment = require(raw, Entity::Comment, comment_id)?.into_comment()?;
        policy::can_delete_comment(actor_id, comment.author_id)?;

        tx.execute(
          "DELETE FROM comments WHERE comment_id = ?1",
          [encode_uuid(comment_id)],
        )?;
        Counter::comments(comment.subject.kind).lower(tx, comment.subject.id, 1)?;
        Ok(())
      })
      .await
  }

  async fn list_comments(&self, subject: SubjectRef) -> Result<Vec<Comment>> {
    self
      .read(move |conn| {
        // Distinguish "no comments" from "no such subject".
        Counter::comments(subject.kind).get(conn, subject.id)?;

        let sql = format!(
          "SELECT {COMMENT_COLUMNS} FROM comments
           WHERE subject_kind = ?1 AND subject_id = ?2
           ORDER BY posted_at, rowid"
        );
        let mut stmt = conn.prepare(&sql)?;
        let raws = stmt
          .query_map(
            rusqlite::params![subject.kind.as_str(), encode_uuid(subject.id)],
            RawComment::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        raws.into_iter().map(RawComment::into_comment).collect()
      })
      .await
  }

  // ── Group join requests ───────────────────────────────────────────────────

  async fn submit_join_request(
    &self,
    issue_id: Uuid,
    group_id: Uuid,
    actor_id: Uuid,
  ) -> Result<GroupJoinRequest> {
    self
      .write(move |tx| {
        let issue = require(fetch_issue(tx, issue_id)?, Entity::Issue, issue_id)?;
        let owners = ownership(tx, &issue, group_id)?;
        let initiated_by_group = policy::join_initiator(actor_id, &owners)?;

        if issue.group_id == Some(group_id) {
          return Err(Conflict::AlreadyInGroup { issue: issue_id, group: group_id }.into());
        }

        let pending_exists = tx
          .query_row(
            "SELECT 1 FROM group_join_requests
             WHERE issue_id = ?1 AND group_id = ?2 AND status = 'pending'",
            rusqlite::params![encode_uuid(issue_id), encode_uuid(group_id)],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if pending_exists {
          return Err(Conflict::PendingJoinRequest { issue: issue_id, group: group_id }.into());
        }

        let requested_at = now();
        let auto_approved = policy::is_self_link(actor_id, &owners);
        let request = GroupJoinRequest {
          request_id: Uuid::new_v4(),
          issue_id,
          group_id,
          initiated_by_group,
          status: if auto_approved {
            JoinRequestStatus::Approved
          } else {
            JoinRequestStatus::Pending
          },
          requested_at,
          handled_at: auto_approved.then_some(requested_at),
        };

        tx.execute(
          "INSERT INTO group_join_requests (
             request_id, issue_id, group_id, initiated_by_group,
             status, requested_at, handled_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            encode_uuid(request.request_id),
            encode_uuid(issue_id),
            encode_uuid(group_id),
            initiated_by_group,
            request.status.as_str(),
            encode_dt(requested_at),
            request.handled_at.map(encode_dt)
          ],
        )
        .map_err(|e| {
          on_constraint(e, Conflict::PendingJoinRequest { issue: issue_id, group: group_id })
        })?;

        if auto_approved {
          move_issue(tx, issue_id, Some(group_id))?;
        }

        tracing::debug!(
          request_id = %request.request_id,
          %issue_id,
          %group_id,
          initiated_by_group,
          auto_approved,
          "join request submitted"
        );
        Ok(request)
      })
      .await
  }

  async fn decide_join_request(
    &self,
    request_id: Uuid,
    actor_id: Uuid,
    decision: JoinDecision,
  ) -> Result<GroupJoinRequest> {
    self
      .write(move |tx| {
        let (mut request, owners) = pending_join_request(tx, request_id)?;
        policy::can_decide_join(actor_id, &owners, request.initiated_by_group)?;

        finish_join_request(tx, &mut request, decision.status())?;
        if decision == JoinDecision::Approve {
          move_issue(tx, request.issue_id, Some(request.group_id))?;
        }

        tracing::debug!(%request_id, %actor_id, ?decision, "join request decided");
        Ok(request)
      })
      .await
  }

  async fn cancel_join_request(
    &self,
    request_id: Uuid,
    actor_id: Uuid,
  ) -> Result<GroupJoinRequest> {
    self
      .write(move |tx| {
        let (mut request, owners) = pending_join_request(tx, request_id)?;
        policy::can_cancel_join(actor_id, &owners)?;

        finish_join_request(tx, &mut request, JoinRequestStatus::Cancelled)?;

        tracing::debug!(%request_id, %actor_id, "join request cancelled");
        Ok(request)
      })
      .await
  }

  async fn get_join_request(&self, request_id: Uuid) -> Result<Option<GroupJoinRequest>> {
    self.read(move |conn| fetch_join_request(conn, request_id)).await
  }

  async fn list_join_requests(&self, query: &JoinRequestQuery) -> Result<Vec<GroupJoinRequest>> {
    let issue_id = query.issue_id.map(encode_uuid);
    let group_id = query.group_id.map(encode_uuid);
    let status = query.status.map(|s| s.as_str().to_owned());

    self
      .read(move |conn| {
        let sql = format!(
          "SELECT {JOIN_REQUEST_COLUMNS} FROM group_join_requests
           WHERE (?1 IS NULL OR issue_id = ?1)
             AND (?2 IS NULL OR group_id = ?2)
             AND (?3 IS NULL OR status = ?3)
           ORDER BY requested_at DESC, rowid DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let raws = stmt
          .query_map(
            rusqlite::params![issue_id, group_id, status],
            RawJoinRequest::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        raws.into_iter().map(RawJoinRequest::into_request).collect()
      })
      .await
  }

  // ── Role change requests ──────────────────────────────────────────────────

  async fn submit_role_change_request(
    &self,
    user_id: Uuid,
    role_id: Uuid,
  ) -> Result<RoleChangeRequest> {
    self
      .write(move |tx| {
        let user = require(fetch_user(tx, user_id)?, Entity::User, user_id)?;

        let pending_exists = tx
          .query_row(
            "SELECT 1 FROM role_change_requests WHERE user_id = ?1 AND status = 'pending'",
            [encode_uuid(user_id)],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if pending_exists {
          return Err(Conflict::PendingRoleChange(user_id).into());
        }
        if user.role_id == role_id {
          return Err(Conflict::RoleUnchanged { user: user_id, role: role_id }.into());
        }
        require(fetch_role(tx, role_id)?, Entity::Role, role_id)?;

        let request = RoleChangeRequest {
          request_id:        Uuid::new_v4(),
          user_id,
          requested_role_id: role_id,
          status:            RoleRequestStatus::Pending,
          submitted_at:      now(),
          reviewed_at:       None,
          reviewer_id:       None,
        };

        tx.execute(
          "INSERT INTO role_change_requests (request_id, user_id, requested_role_id, status, submitted_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            encode_uuid(request.request_id),
            encode_uuid(user_id),
            encode_uuid(role_id),
            request.status.as_str(),
            encode_dt(request.submitted_at)
          ],
        )
        .map_err(|e| on_constraint(e, Conflict::PendingRoleChange(user_id)))?;

        tracing::debug!(request_id = %request.request_id, %user_id, %role_id, "role change requested");
        Ok(request)
      })
      .await
  }

  async fn decide_role_change_request(
    &self,
    request_id: Uuid,
    reviewer_id: Uuid,
    decision: RoleDecision,
  ) -> Result<RoleChangeRequest> {
    self
      .write(move |tx| {
        let mut request = require(
          fetch_role_request(tx, request_id)?,
          Entity::RoleChangeRequest,
          request_id,
        )?;
        if !request.status.is_pending() {
          return Err(Conflict::NotPending(request_id).into());
        }

        let reviewer_role = match fetch_user(tx, reviewer_id)? {
          Some(reviewer) => fetch_role(tx, reviewer.role_id)?,
          None => None,
        };
        policy::can_review_role_change(reviewer_role.as_ref())?;

        if decision == RoleDecision::Approve {
          tx.execute(
            "UPDATE users SET role_id = ?1 WHERE user_id = ?2",
            rusqlite::params![
              encode_uuid(request.requested_role_id),
              encode_uuid(request.user_id)
            ],
          )?;
        }

        let reviewed_at = now();
        request.status = decision.status();
        request.reviewed_at = Some(reviewed_at);
        request.reviewer_id = Some(reviewer_id);
        tx.execute(
          "UPDATE role_change_requests
           SET status = ?1, reviewed_at = ?2, reviewer_id = ?3
           WHERE request_id = ?4",
          rusqlite::params![
            request.status.as_str(),
            encode_dt(reviewed_at),
            encode_uuid(reviewer_id),
            encode_uuid(request_id)
          ],
        )?;

        tracing::debug!(%request_id, %reviewer_id, ?decision, "role change decided");
        Ok(request)
      })
      .await
  }

  async fn list_role_change_requests(
    &self,
    status: Option<RoleRequestStatus>,
  ) -> Result<Vec<RoleChangeRequest>> {
    let status = status.map(|s| s.as_str().to_owned());

    self
      .read(move |conn| {
        let sql = format!(
          "SELECT {ROLE_REQUEST_COLUMNS} FROM role_change_requests
           WHERE (?1 IS NULL OR status = ?1)
           ORDER BY submitted_at, rowid"
        );
        let mut stmt = conn.prepare(&sql)?;
        let raws = stmt
          .query_map([status], RawRoleRequest::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        raws.into_iter().map(RawRoleRequest::into_request).collect()
      })
      .await
  }

  // ── Maintenance ───────────────────────────────────────────────────────────

  async fn recount_counters(&self) -> Result<RecountReport> {
    let report = self
      .write(|tx| {
        let mut report = RecountReport::default();

        for kind in [SubjectKind::Issue, SubjectKind::Group] {
          let upvotes = Counter::upvotes(kind);
          let comments = Counter::comments(kind);
          let tag = kind.as_str();

          report.upvote_counts += upvotes.reconcile(
            tx,
            &format!(
              "COALESCE((SELECT SUM(v.weight) FROM votes v
                         WHERE v.subject_kind = '{tag}' AND v.subject_id = s.{key}), 0)",
              key = upvotes.key,
            ),
          )?;
          report.comment_counts += comments.reconcile(
            tx,
            &format!(
              "(SELECT COUNT(*) FROM comments c
                WHERE c.subject_kind = '{tag}' AND c.subject_id = s.{key})",
              key = comments.key,
            ),
          )?;
        }

        report.issue_counts += Counter::ISSUES_IN_GROUP.reconcile(
          tx,
          "(SELECT COUNT(*) FROM issues i WHERE i.group_id = s.group_id)",
        )?;

        Ok(report)
      })
      .await?;

    if report.total() > 0 {
      tracing::warn!(?report, "recount corrected drifted counters");
    } else {
      tracing::info!("recount found no drift");
    }
    Ok(report)
  }
}
