//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with fixed microsecond precision
//! so that text ordering matches time ordering. UUIDs are stored as hyphenated
//! lowercase strings. Enum discriminants use their lowercase names.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use civic_core::{
  entity::{Comment, Group, Issue, Role, User},
  request::{GroupJoinRequest, RoleChangeRequest},
  subject::{SubjectKind, SubjectRef},
  vote::Vote,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── Discriminants ───────────────────────────────────────────────────────────

/// Parse a lowercase enum discriminant read back from a column.
pub fn decode_discriminant<T: FromStr>(kind: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| {
    Error::Core(civic_core::Error::UnknownDiscriminant {
      kind,
      value: s.to_owned(),
    })
  })
}

fn decode_subject(kind: &str, id: &str) -> Result<SubjectRef> {
  Ok(SubjectRef {
    kind: decode_discriminant::<SubjectKind>("subject kind", kind)?,
    id:   decode_uuid(id)?,
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────
//
// Each `Raw*` struct holds the strings read directly from one row, in the
// order of its `*_COLUMNS` constant.

pub const ROLE_COLUMNS: &str = "role_id, title, upvote_weight, is_admin";

pub struct RawRole {
  pub role_id:       String,
  pub title:         String,
  pub upvote_weight: i64,
  pub is_admin:      bool,
}

impl RawRole {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      role_id:       row.get(0)?,
      title:         row.get(1)?,
      upvote_weight: row.get(2)?,
      is_admin:      row.get(3)?,
    })
  }

  pub fn into_role(self) -> Result<Role> {
    Ok(Role {
      role_id:       decode_uuid(&self.role_id)?,
      title:         self.title,
      upvote_weight: self.upvote_weight,
      is_admin:      self.is_admin,
    })
  }
}

pub const USER_COLUMNS: &str = "user_id, username, role_id, created_at";

pub struct RawUser {
  pub user_id:    String,
  pub username:   String,
  pub role_id:    String,
  pub created_at: String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(0)?,
      username:   row.get(1)?,
      role_id:    row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:    decode_uuid(&self.user_id)?,
      username:   self.username,
      role_id:    decode_uuid(&self.role_id)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const GROUP_COLUMNS: &str =
  "group_id, name, owner_id, upvote_count, comment_count, issue_count, created_at";

pub struct RawGroup {
  pub group_id:      String,
  pub name:          String,
  pub owner_id:      String,
  pub upvote_count:  i64,
  pub comment_count: i64,
  pub issue_count:   i64,
  pub created_at:    String,
}

impl RawGroup {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      group_id:      row.get(0)?,
      name:          row.get(1)?,
      owner_id:      row.get(2)?,
      upvote_count:  row.get(3)?,
      comment_count: row.get(4)?,
      issue_count:   row.get(5)?,
      created_at:    row.get(6)?,
    })
  }

  pub fn into_group(self) -> Result<Group> {
    Ok(Group {
      group_id:      decode_uuid(&self.group_id)?,
      name:          self.name,
      owner_id:      decode_uuid(&self.owner_id)?,
      upvote_count:  self.upvote_count,
      comment_count: self.comment_count,
      issue_count:   self.issue_count,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

pub const ISSUE_COLUMNS: &str = "issue_id, title, description, owner_id, group_id, \
                                 upvote_count, comment_count, posted_at";

pub struct RawIssue {
  pub issue_id:      String,
  pub title:         String,
  pub description:   String,
  pub owner_id:      String,
  pub group_id:      Option<String>,
  pub upvote_count:  i64,
  pub comment_count: i64,
  pub posted_at:     String,
}

impl RawIssue {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      issue_id:      row.get(0)?,
      title:         row.get(1)?,
      description:   row.get(2)?,
      owner_id:      row.get(3)?,
      group_id:      row.get(4)?,
      upvote_count:  row.get(5)?,
      comment_count: row.get(6)?,
      posted_at:     row.get(7)?,
    })
  }

  pub fn into_issue(self) -> Result<Issue> {
    Ok(Issue {
      issue_id:      decode_uuid(&self.issue_id)?,
      title:         self.title,
      description:   self.description,
      owner_id:      decode_uuid(&self.owner_id)?,
      group_id:      decode_opt_uuid(self.group_id)?,
      upvote_count:  self.upvote_count,
      comment_count: self.comment_count,
      posted_at:     decode_dt(&self.posted_at)?,
    })
  }
}

pub const COMMENT_COLUMNS: &str =
  "comment_id, subject_kind, subject_id, author_id, content, posted_at";

pub struct RawComment {
  pub comment_id:   String,
  pub subject_kind: String,
  pub subject_id:   String,
  pub author_id:    String,
  pub content:      String,
  pub posted_at:    String,
}

impl RawComment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comment_id:   row.get(0)?,
      subject_kind: row.get(1)?,
      subject_id:   row.get(2)?,
      author_id:    row.get(3)?,
      content:      row.get(4)?,
      posted_at:    row.get(5)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id: decode_uuid(&self.comment_id)?,
      subject:    decode_subject(&self.subject_kind, &self.subject_id)?,
      author_id:  decode_uuid(&self.author_id)?,
      content:    self.content,
      posted_at:  decode_dt(&self.posted_at)?,
    })
  }
}

pub const VOTE_COLUMNS: &str = "subject_kind, subject_id, voter_id, weight, cast_at";

pub struct RawVote {
  pub subject_kind: String,
  pub subject_id:   String,
  pub voter_id:     String,
  pub weight:       i64,
  pub cast_at:      String,
}

impl RawVote {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_kind: row.get(0)?,
      subject_id:   row.get(1)?,
      voter_id:     row.get(2)?,
      weight:       row.get(3)?,
      cast_at:      row.get(4)?,
    })
  }

  pub fn into_vote(self) -> Result<Vote> {
    Ok(Vote {
      subject:  decode_subject(&self.subject_kind, &self.subject_id)?,
      voter_id: decode_uuid(&self.voter_id)?,
      weight:   self.weight,
      cast_at:  decode_dt(&self.cast_at)?,
    })
  }
}

pub const JOIN_REQUEST_COLUMNS: &str =
  "request_id, issue_id, group_id, initiated_by_group, status, requested_at, handled_at";

pub struct RawJoinRequest {
  pub request_id:         String,
  pub issue_id:           String,
  pub group_id:           String,
  pub initiated_by_group: bool,
  pub status:             String,
  pub requested_at:       String,
  pub handled_at:         Option<String>,
}

impl RawJoinRequest {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      request_id:         row.get(0)?,
      issue_id:           row.get(1)?,
      group_id:           row.get(2)?,
      initiated_by_group: row.get(3)?,
      status:             row.get(4)?,
      requested_at:       row.get(5)?,
      handled_at:         row.get(6)?,
    })
  }

  pub fn into_request(self) -> Result<GroupJoinRequest> {
    Ok(GroupJoinRequest {
      request_id:         decode_uuid(&self.request_id)?,
      issue_id:           decode_uuid(&self.issue_id)?,
      group_id:           decode_uuid(&self.group_id)?,
      initiated_by_group: self.initiated_by_group,
      status:             decode_discriminant("join request status", &self.status)?,
      requested_at:       decode_dt(&self.requested_at)?,
      handled_at:         decode_opt_dt(self.handled_at)?,
    })
  }
}

pub const ROLE_REQUEST_COLUMNS: &str = "request_id, user_id, requested_role_id, status, \
                                        submitted_at, reviewed_at, reviewer_id";

pub struct RawRoleRequest {
  pub request_id:        String,
  pub user_id:           String,
  pub requested_role_id: String,
  pub status:            String,
  pub submitted_at:      String,
  pub reviewed_at:       Option<String>,
  pub reviewer_id:       Option<String>,
}

impl RawRoleRequest {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      request_id:        row.get(0)?,
      user_id:           row.get(1)?,
      requested_role_id: row.get(2)?,
      status:            row.get(3)?,
      submitted_at:      row.get(4)?,
      reviewed_at:       row.get(5)?,
      reviewer_id:       row.get(6)?,
    })
  }

  pub fn into_request(self) -> Result<RoleChangeRequest> {
    Ok(RoleChangeRequest {
      request_id:        decode_uuid(&self.request_id)?,
      user_id:           decode_uuid(&self.user_id)?,
      requested_role_id: decode_uuid(&self.requested_role_id)?,
      status:            decode_discriminant("role request status", &self.status)?,
      submitted_at:      decode_dt(&self.submitted_at)?,
      reviewed_at:       decode_opt_dt(self.reviewed_at)?,
      reviewer_id:       decode_opt_uuid(self.reviewer_id)?,
    })
  }
}
