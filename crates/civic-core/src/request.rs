//! Request workflows: linking an issue to a group, and changing a user's role.
//!
//! Both are small state machines with a single non-terminal state. A request
//! starts `Pending` and moves exactly once to one of its terminal states; the
//! store refuses any transition out of a terminal state with
//! [`Conflict::NotPending`](crate::Conflict::NotPending).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Group join requests ─────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::IntoStaticStr,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JoinRequestStatus {
  Pending,
  Approved,
  Declined,
  Cancelled,
}

impl JoinRequestStatus {
  pub fn as_str(self) -> &'static str { self.into() }

  pub fn is_pending(self) -> bool { matches!(self, Self::Pending) }
}

/// A proposal to put an issue into a group.
///
/// `initiated_by_group` records which side proposed the link: `true` when the
/// group owner invited the issue, `false` when the issue owner asked to join.
/// The other side is the one entitled to decide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupJoinRequest {
  pub request_id:         Uuid,
  pub issue_id:           Uuid,
  pub group_id:           Uuid,
  pub initiated_by_group: bool,
  pub status:             JoinRequestStatus,
  pub requested_at:       DateTime<Utc>,
  pub handled_at:         Option<DateTime<Utc>>,
}

/// The non-initiating party's verdict on a join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinDecision {
  Approve,
  Decline,
}

impl JoinDecision {
  pub fn status(self) -> JoinRequestStatus {
    match self {
      Self::Approve => JoinRequestStatus::Approved,
      Self::Decline => JoinRequestStatus::Declined,
    }
  }
}

/// Filter for [`crate::store::CivicStore::list_join_requests`]. Unset fields
/// match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JoinRequestQuery {
  pub issue_id: Option<Uuid>,
  pub group_id: Option<Uuid>,
  pub status:   Option<JoinRequestStatus>,
}

// ─── Role change requests ────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::IntoStaticStr,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RoleRequestStatus {
  Pending,
  Approved,
  Rejected,
}

impl RoleRequestStatus {
  pub fn as_str(self) -> &'static str { self.into() }

  pub fn is_pending(self) -> bool { matches!(self, Self::Pending) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleChangeRequest {
  pub request_id:        Uuid,
  pub user_id:           Uuid,
  pub requested_role_id: Uuid,
  pub status:            RoleRequestStatus,
  pub submitted_at:      DateTime<Utc>,
  pub reviewed_at:       Option<DateTime<Utc>>,
  pub reviewer_id:       Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleDecision {
  Approve,
  Reject,
}

impl RoleDecision {
  pub fn status(self) -> RoleRequestStatus {
    match self {
      Self::Approve => RoleRequestStatus::Approved,
      Self::Reject => RoleRequestStatus::Rejected,
    }
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr as _;

  use super::*;

  #[test]
  fn status_discriminants_match_serde() {
    for status in [
      JoinRequestStatus::Pending,
      JoinRequestStatus::Approved,
      JoinRequestStatus::Declined,
      JoinRequestStatus::Cancelled,
    ] {
      let json = serde_json::to_value(status).unwrap();
      assert_eq!(json.as_str(), Some(status.as_str()));
      assert_eq!(JoinRequestStatus::from_str(status.as_str()).unwrap(), status);
    }
    assert_eq!(RoleRequestStatus::Rejected.as_str(), "rejected");
    assert!(RoleRequestStatus::from_str("declined").is_err());
  }

  #[test]
  fn decisions_map_onto_terminal_states() {
    assert_eq!(JoinDecision::Approve.status(), JoinRequestStatus::Approved);
    assert_eq!(JoinDecision::Decline.status(), JoinRequestStatus::Declined);
    assert_eq!(RoleDecision::Reject.status(), RoleRequestStatus::Rejected);
    assert!(!JoinDecision::Decline.status().is_pending());
  }
}
