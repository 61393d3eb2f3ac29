//! Database capability for TalkQL.
//!
//! Wraps a SQLite connection behind scoped, mutex-guarded access and
//! provides the statement executor that classifies SQL by verb, runs it,
//! and renders a human-readable result line.

pub mod db;
pub mod error;
pub mod executor;

pub use db::Database;
pub use error::DbError;
pub use executor::{SqlExecutor, SqliteExecutor, StatementKind};
