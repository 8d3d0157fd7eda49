//! Subjects: the things that can be voted on and commented on.
//!
//! An issue and a group both carry their own `upvote_count` and
//! `comment_count`; a [`SubjectRef`] names one of them without caring which
//! table it lives in.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of entity a subject is.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::IntoStaticStr,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SubjectKind {
  Issue,
  Group,
}

impl SubjectKind {
  /// The discriminant stored in `subject_kind` columns.
  pub fn as_str(self) -> &'static str { self.into() }
}

/// A typed pointer to an issue or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectRef {
  pub kind: SubjectKind,
  pub id:   Uuid,
}

impl SubjectRef {
  pub fn issue(id: Uuid) -> Self { Self { kind: SubjectKind::Issue, id } }

  pub fn group(id: Uuid) -> Self { Self { kind: SubjectKind::Group, id } }
}

impl fmt::Display for SubjectRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.kind.as_str(), self.id)
  }
}
