//! Error type for `civic-store-sqlite`.

use civic_core::{Conflict, Forbidden, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] civic_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

impl From<Conflict> for Error {
  fn from(c: Conflict) -> Self { Self::Core(c.into()) }
}

impl From<Forbidden> for Error {
  fn from(f: Forbidden) -> Self { Self::Core(f.into()) }
}

impl StoreError for Error {
  fn domain(&self) -> Option<&civic_core::Error> {
    match self {
      Self::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
