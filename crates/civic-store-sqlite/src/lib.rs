//! SQLite backend for the Civic store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every mutating operation is a single
//! `BEGIN IMMEDIATE` transaction on that thread, which makes each
//! read-check-write sequence indivisible.

mod counters;
mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
