//! # homestash-store
//!
//! Relational storage for the homestash household-object tracker, backed by
//! SQLite.  The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for every domain
//! model.  Referential integrity (uniqueness, foreign keys, the
//! no-delete-while-referenced rule for locations) is enforced at this
//! boundary, so it holds even for callers that bypass the HTTP layer.

pub mod categories;
pub mod database;
pub mod history;
pub mod locations;
pub mod migrations;
pub mod models;
pub mod objects;
pub mod users;

mod error;

pub use categories::DEFAULT_CATEGORY_COLOR;
pub use database::Database;
pub use error::StoreError;
pub use models::*;
pub use objects::{NewObject, ObjectFilter, UpdateObject};
