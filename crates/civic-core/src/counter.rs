//! Saturating arithmetic for denormalized counters.
//!
//! Counters are caches over the vote, comment and issue tables. A decrement
//! that would take one below zero means the cache has drifted from the rows it
//! summarises; the value is clamped at zero and the caller is told so it can
//! log the drift. The clamp is not a substitute for doing the mutation and the
//! row change in one transaction.

/// Result of a floored decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decrement {
  pub value:   i64,
  /// `true` when `by` exceeded the current value and the floor kicked in.
  pub clamped: bool,
}

pub fn increment(current: i64, by: i64) -> i64 { current.saturating_add(by) }

/// `max(current - by, 0)`, reporting whether the floor was hit.
pub fn decrement(current: i64, by: i64) -> Decrement {
  let raw = current.saturating_sub(by);
  if raw < 0 {
    Decrement { value: 0, clamped: true }
  } else {
    Decrement { value: raw, clamped: false }
  }
}
