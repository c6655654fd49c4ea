//! SQLite connection wrapper (one connection per CLI invocation).

use crate::db::migrate::run_pending_migrations;
use crate::errors::AppResult;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

pub struct DbPool {
    pub conn: Connection,
}

impl DbPool {
    /// Open the database file, enable foreign keys and wait on a busy
    /// writer instead of failing immediately.
    pub fn new(path: &str, busy_timeout_ms: u64) -> AppResult<Self> {
        let conn = Connection::open(Path::new(path))?;
        Self::configure(&conn, busy_timeout_ms)?;
        Ok(Self { conn })
    }

    /// Open and bring the schema up to date.
    pub fn open_migrated(path: &str, busy_timeout_ms: u64) -> AppResult<Self> {
        let pool = Self::new(path, busy_timeout_ms)?;
        run_pending_migrations(&pool.conn)?;
        Ok(pool)
    }

    /// Private in-memory database with the full schema (tests, dry runs).
    pub fn in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn, DEFAULT_BUSY_TIMEOUT_MS)?;
        run_pending_migrations(&conn)?;
        Ok(Self { conn })
    }

    fn configure(conn: &Connection, busy_timeout_ms: u64) -> AppResult<()> {
        conn.busy_timeout(Duration::from_millis(busy_timeout_ms))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(())
    }
}
