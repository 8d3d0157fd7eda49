//! Core types and trait definitions for the Civic engagement store.
//!
//! This crate has no HTTP or database dependencies. It holds
//! the domain types, the pure counter and authorization rules, and the
//! [`store::CivicStore`] trait that storage backends implement.

// Backends implement the trait's `impl Future` methods with `async fn`.
// The returned futures are declared `Send` in the trait itself.
#![allow(async_fn_in_trait)]

pub mod counter;
pub mod entity;
pub mod error;
pub mod policy;
pub mod request;
pub mod store;
pub mod subject;
pub mod vote;

pub use error::{Conflict, Entity, Error, Forbidden, Result, StoreError};
