//! Vote ledger types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::subject::SubjectRef;

/// One voter's upvote on one subject. `weight` is the voter's role weight at
/// `cast_at` and never changes afterwards, even if the voter's role does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
  pub subject:  SubjectRef,
  pub voter_id: Uuid,
  pub weight:   i64,
  pub cast_at:  DateTime<Utc>,
}

/// What a vote operation left behind: whether the voter now has a vote on the
/// subject, and the subject's `upvote_count` after the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteOutcome {
  pub voted: bool,
  pub count: i64,
}

/// Weight used when a voter's role cannot be resolved.
pub const FALLBACK_WEIGHT: i64 = 1;

/// The weight a new vote is recorded with, given the voter's role weight if it
/// could be looked up. Anything unresolved or below one becomes
/// [`FALLBACK_WEIGHT`].
pub fn effective_weight(role_weight: Option<i64>) -> i64 {
  match role_weight {
    Some(w) if w >= 1 => w,
    _ => FALLBACK_WEIGHT,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn role_weight_is_used_when_resolved() {
    assert_eq!(effective_weight(Some(3)), 3);
  }

  #[test]
  fn unresolved_or_nonsense_weight_falls_back() {
    assert_eq!(effective_weight(None), FALLBACK_WEIGHT);
    assert_eq!(effective_weight(Some(0)), FALLBACK_WEIGHT);
    assert_eq!(effective_weight(Some(-4)), FALLBACK_WEIGHT);
  }
}
