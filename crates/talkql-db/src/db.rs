//! Database connection management.
//!
//! Wraps a single rusqlite Connection in a Mutex. Every statement acquires
//! the connection through [`Database::with_conn`]; the guard is released
//! when the closure returns, on the success and the failure path alike.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::Connection;
use tracing::info;

use crate::error::DbError;

/// Thread-safe SQLite database wrapper.
///
/// WAL mode allows concurrent readers at the OS level; within the process
/// all access is serialized through the mutex since rusqlite's Connection
/// is not Sync.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a database at the given path.
    ///
    /// Configures WAL mode, synchronous=NORMAL, foreign keys, and a busy
    /// timeout so a locked database blocks for a bounded time instead of
    /// failing immediately or hanging forever.
    pub fn new(path: &Path, busy_timeout: Duration) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DbError::Open(e.to_string()))?;
        }

        let conn = Connection::open(path).map_err(|e| DbError::Open(e.to_string()))?;
        configure(&conn, busy_timeout)?;

        info!("Database opened at {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory().map_err(|e| DbError::Open(e.to_string()))?;
        configure(&conn, Duration::from_millis(5_000))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Execute a closure with a reference to the underlying connection.
    ///
    /// This is the only way to reach the connection. The mutex is held for
    /// the duration of the closure and released when it returns.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Connection) -> Result<T, DbError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DbError::Storage(format!("database lock poisoned: {}", e)))?;
        f(&conn)
    }
}

fn configure(conn: &Connection, busy_timeout: Duration) -> Result<(), DbError> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys = ON;",
    )
    .map_err(|e| DbError::Open(format!("failed to set pragmas: {}", e)))?;
    conn.busy_timeout(busy_timeout)
        .map_err(|e| DbError::Open(format!("failed to set busy timeout: {}", e)))?;
    Ok(())
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_database() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            conn.execute("CREATE TABLE t (x INTEGER)", [])
                .map_err(|e| DbError::Storage(e.to_string()))?;
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
                .map_err(|e| DbError::Storage(e.to_string()))?;
            assert_eq!(count, 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::new(&path, Duration::from_millis(100)).unwrap();

        db.with_conn(|conn| {
            conn.execute("CREATE TABLE t (x INTEGER)", [])
                .map_err(|e| DbError::Storage(e.to_string()))?;
            Ok(())
        })
        .unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let enabled: i64 = conn
                .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
                .map_err(|e| DbError::Storage(e.to_string()))?;
            assert_eq!(enabled, 1);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_with_conn_releases_lock_on_error() {
        let db = Database::in_memory().unwrap();
        let failed: Result<(), DbError> =
            db.with_conn(|_| Err(DbError::Storage("deliberate".to_string())));
        assert!(failed.is_err());

        // A failed closure must not wedge the connection.
        db.with_conn(|conn| {
            conn.execute("CREATE TABLE again (x INTEGER)", [])
                .map_err(|e| DbError::Storage(e.to_string()))?;
            Ok(())
        })
        .unwrap();
    }
}
