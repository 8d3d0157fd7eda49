//! Authorization and input rules, as pure functions over ownership data.
//!
//! The store looks up the owners inside its transaction and asks these
//! functions whether the actor may proceed, so the rules can be tested without
//! a database.

use uuid::Uuid;

use crate::{Error, Forbidden, entity::Role};

/// The two owners a join request sits between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ownership {
  pub issue_owner: Uuid,
  pub group_owner: Uuid,
}

impl Ownership {
  fn owns_either(&self, actor: Uuid) -> bool {
    actor == self.issue_owner || actor == self.group_owner
  }
}

// ─── Join requests ───────────────────────────────────────────────────────────

/// Which side `actor` is proposing from: `Ok(true)` if the group owner is
/// inviting the issue, `Ok(false)` if the issue owner is asking to join. The
/// group side wins when the actor owns both.
pub fn join_initiator(actor: Uuid, owners: &Ownership) -> Result<bool, Forbidden> {
  if actor == owners.group_owner {
    Ok(true)
  } else if actor == owners.issue_owner {
    Ok(false)
  } else {
    Err(Forbidden::NotAnOwner)
  }
}

/// A request needs no second party when the actor owns both sides.
pub fn is_self_link(actor: Uuid, owners: &Ownership) -> bool {
  actor == owners.issue_owner && actor == owners.group_owner
}

/// Only the party that did not initiate may approve or decline.
pub fn can_decide_join(
  actor: Uuid,
  owners: &Ownership,
  initiated_by_group: bool,
) -> Result<(), Forbidden> {
  let decider = if initiated_by_group {
    owners.issue_owner
  } else {
    owners.group_owner
  };
  if actor == decider { Ok(()) } else { Err(Forbidden::NotDecider) }
}

/// Either owner may withdraw a pending request, whoever proposed it.
pub fn can_cancel_join(actor: Uuid, owners: &Ownership) -> Result<(), Forbidden> {
  if owners.owns_either(actor) { Ok(()) } else { Err(Forbidden::NotAnOwner) }
}

/// Taking an issue out of its group is allowed to either side of the link.
pub fn can_detach_issue(actor: Uuid, owners: &Ownership) -> Result<(), Forbidden> {
  can_cancel_join(actor, owners)
}

// ─── Issues & comments ───────────────────────────────────────────────────────

pub fn can_delete_issue(actor: Uuid, owner: Uuid) -> Result<(), Forbidden> {
  if actor == owner { Ok(()) } else { Err(Forbidden::NotIssueOwner) }
}

pub fn can_delete_comment(actor: Uuid, author: Uuid) -> Result<(), Forbidden> {
  if actor == author { Ok(()) } else { Err(Forbidden::NotCommentAuthor) }
}

/// Trim comment content, refusing content that is empty afterwards.
pub fn comment_content(raw: &str) -> Result<&str, Error> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Err(Error::Invalid("comment content must not be empty".into()));
  }
  Ok(trimmed)
}

// ─── Roles ───────────────────────────────────────────────────────────────────

/// `reviewer_role` is the reviewer's current role, if it resolves at all.
pub fn can_review_role_change(reviewer_role: Option<&Role>) -> Result<(), Forbidden> {
  match reviewer_role {
    Some(role) if role.is_admin => Ok(()),
    _ => Err(Forbidden::NotAdministrator),
  }
}

pub fn role_weight(weight: i64) -> Result<i64, Error> {
  if weight < 1 {
    return Err(Error::Invalid(format!(
      "upvote weight must be at least 1, got {weight}"
    )));
  }
  Ok(weight)
}
