//! Statement execution and result formatting.
//!
//! Classifies each SQL statement by verb, runs it against the database, and
//! renders one human-readable result per statement: a status phrase for
//! writes, a header-plus-rows table for reads.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::Connection;

use crate::db::Database;
use crate::error::DbError;

// =============================================================================
// Statement classification
// =============================================================================

/// Statement category, decided by verb substring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Create,
    Drop,
    Update,
    Insert,
    Alter,
    Read,
    Other,
}

impl StatementKind {
    /// Classify a statement by case-insensitive substring match.
    ///
    /// Rules are checked in a fixed priority order and the first match wins:
    /// create, drop, update, insert, alter, select/show. A statement
    /// containing several verbs (`CREATE TABLE t AS SELECT ...`) takes the
    /// first-listed rule. This ordering is a compatibility policy, not an
    /// accident.
    pub fn classify(statement: &str) -> Self {
        let lower = statement.to_lowercase();
        if lower.contains("create") {
            StatementKind::Create
        } else if lower.contains("drop") {
            StatementKind::Drop
        } else if lower.contains("update") {
            StatementKind::Update
        } else if lower.contains("insert") {
            StatementKind::Insert
        } else if lower.contains("alter") {
            StatementKind::Alter
        } else if lower.contains("select") || lower.contains("show") {
            StatementKind::Read
        } else {
            StatementKind::Other
        }
    }
}

// =============================================================================
// SqlExecutor
// =============================================================================

/// A capability that executes one SQL statement and reports the outcome.
///
/// Each call commits independently; there is no transactional grouping
/// across the statements of a batch. When a later statement fails, earlier
/// statements stay committed. Current behavior, pending product-owner
/// confirmation.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Execute one statement and return a human-readable result line.
    async fn execute(&self, statement: &str) -> Result<String, DbError>;
}

/// SQLite-backed executor.
pub struct SqliteExecutor {
    db: Arc<Database>,
}

impl SqliteExecutor {
    /// Create an executor over the given database.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SqlExecutor for SqliteExecutor {
    async fn execute(&self, statement: &str) -> Result<String, DbError> {
        let kind = StatementKind::classify(statement);
        tracing::debug!(?kind, statement, "executing statement");

        match kind {
            StatementKind::Read => self.db.with_conn(|conn| fetch_rows(conn, statement)),
            StatementKind::Update => {
                let affected = self.db.with_conn(|conn| run_statement(conn, statement))?;
                Ok(format!("successfully updated {} row(s)", affected))
            }
            StatementKind::Insert => {
                let affected = self.db.with_conn(|conn| run_statement(conn, statement))?;
                Ok(format!("successfully inserted {} row(s)", affected))
            }
            StatementKind::Create => {
                self.db.with_conn(|conn| run_statement(conn, statement))?;
                Ok("create operation successful".to_string())
            }
            StatementKind::Drop => {
                self.db.with_conn(|conn| run_statement(conn, statement))?;
                Ok("drop operation successful".to_string())
            }
            StatementKind::Alter => {
                self.db.with_conn(|conn| run_statement(conn, statement))?;
                Ok("alter operation successful".to_string())
            }
            StatementKind::Other => {
                self.db.with_conn(|conn| run_statement(conn, statement))?;
                Ok("operation successful".to_string())
            }
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn run_statement(conn: &Connection, statement: &str) -> Result<usize, DbError> {
    conn.execute(statement, [])
        .map_err(|e| DbError::execution(statement, e))
}

/// Run a read statement and render header + rows.
///
/// Column names come from the prepared statement, so an empty result set is
/// a normal outcome ("no rows returned") rather than an indexing hazard.
fn fetch_rows(conn: &Connection, statement: &str) -> Result<String, DbError> {
    let mut stmt = conn
        .prepare(statement)
        .map_err(|e| DbError::execution(statement, e))?;

    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

    let mut rows = stmt
        .query([])
        .map_err(|e| DbError::execution(statement, e))?;

    let mut lines: Vec<String> = Vec::new();
    while let Some(row) = rows.next().map_err(|e| DbError::execution(statement, e))? {
        let mut values = Vec::with_capacity(columns.len());
        for idx in 0..columns.len() {
            let value = row
                .get_ref(idx)
                .map_err(|e| DbError::execution(statement, e))?;
            values.push(render_value(value));
        }
        lines.push(values.join(" "));
    }

    if lines.is_empty() {
        return Ok("no rows returned".to_string());
    }

    Ok(format!("{}\n{}", columns.join(" "), lines.join("\n")))
}

fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(r) => r.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

// =============================================================================
// Tests
// =============================================================================
