//! Denormalized counter cells and their in-transaction mutation.
//!
//! Everything here takes a `&Connection` that the caller has already wrapped
//! in an IMMEDIATE transaction. Nothing in this module is reachable from
//! outside the crate; counters only move as part of a store operation.

use civic_core::{Entity, counter, subject::SubjectKind};
use rusqlite::{Connection, OptionalExtension as _};
use uuid::Uuid;

use crate::{Error, Result, encode::encode_uuid};

/// One counter column on one entity table.
#[derive(Debug, Clone, Copy)]
pub struct Counter {
  pub entity: Entity,
  pub table:  &'static str,
  pub key:    &'static str,
  pub column: &'static str,
}

impl Counter {
  pub const ISSUES_IN_GROUP: Self = Self {
    entity: Entity::Group,
    table:  "issue_groups",
    key:    "group_id",
    column: "issue_count",
  };

  pub fn upvotes(kind: SubjectKind) -> Self { Self::on_subject(kind, "upvote_count") }

  pub fn comments(kind: SubjectKind) -> Self { Self::on_subject(kind, "comment_count") }

  fn on_subject(kind: SubjectKind, column: &'static str) -> Self {
    let (entity, table, key) = subject_table(kind);
    Self { entity, table, key, column }
  }

  /// Current value; `NotFound` if the owning row does not exist.
  pub fn get(&self, conn: &Connection, id: Uuid) -> Result<i64> {
    let sql = format!(
      "SELECT {} FROM {} WHERE {} = ?1",
      self.column, self.table, self.key
    );
    conn
      .query_row(&sql, [encode_uuid(id)], |r| r.get(0))
      .optional()?
      .ok_or_else(|| civic_core::Error::not_found(self.entity, id).into())
  }

  pub fn set(&self, conn: &Connection, id: Uuid, value: i64) -> Result<()> {
    let sql = format!(
      "UPDATE {} SET {} = ?1 WHERE {} = ?2",
      self.table, self.column, self.key
    );
    conn.execute(&sql, rusqlite::params![value, encode_uuid(id)])?;
    Ok(())
  }

  /// Add `by` and return the new value.
  pub fn raise(&self, conn: &Connection, id: Uuid, by: i64) -> Result<i64> {
    let next = counter::increment(self.get(conn, id)?, by);
    self.set(conn, id, next)?;
    Ok(next)
  }

  /// Subtract `by`, floored at zero, and return the new value. Hitting the
  /// floor means the cache had drifted from its rows and is logged.
  pub fn lower(&self, conn: &Connection, id: Uuid, by: i64) -> Result<i64> {
    let current = self.get(conn, id)?;
    let next = counter::decrement(current, by);
    if next.clamped {
      tracing::warn!(
        table = self.table,
        column = self.column,
        %id,
        current,
        by,
        "counter clamped at zero; cached value had drifted from its rows"
      );
    }
    self.set(conn, id, next.value)?;
    Ok(next.value)
  }

  /// Overwrite every row whose cached value disagrees with `expected`, a SQL
  /// expression over the row alias `s`. Returns how many rows were corrected.
  pub fn reconcile(&self, conn: &Connection, expected: &str) -> Result<usize> {
    let sql = format!(
      "SELECT s.{key}, s.{column}, {expected} AS expected
       FROM {table} s
       WHERE s.{column} != {expected}",
      key = self.key,
      column = self.column,
      table = self.table,
    );

    let drifted: Vec<(String, i64, i64)> = {
      let mut stmt = conn.prepare(&sql)?;
      stmt
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?
        .collect::<rusqlite::Result<_>>()?
    };

    for (id, cached, expected) in &drifted {
      tracing::warn!(
        table = self.table,
        column = self.column,
        id = %id,
        cached,
        expected,
        "correcting drifted counter"
      );
      let sql = format!(
        "UPDATE {} SET {} = ?1 WHERE {} = ?2",
        self.table, self.column, self.key
      );
      conn.execute(&sql, rusqlite::params![expected, id])?;
    }

    Ok(drifted.len())
  }
}

/// `(entity, table, primary key column)` for a subject kind.
pub fn subject_table(kind: SubjectKind) -> (Entity, &'static str, &'static str) {
  match kind {
    SubjectKind::Issue => (Entity::Issue, "issues", "issue_id"),
    SubjectKind::Group => (Entity::Group, "issue_groups", "group_id"),
  }
}

/// Whether a rusqlite error is a UNIQUE/CHECK/FOREIGN KEY violation.
pub fn is_constraint_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _) if f.code == rusqlite::ErrorCode::ConstraintViolation
  )
}

/// Map a constraint violation on an insert to the given domain error; pass
/// every other failure through.
pub fn on_constraint(e: rusqlite::Error, conflict: impl Into<Error>) -> Error {
  if is_constraint_violation(&e) { conflict.into() } else { e.into() }
}
