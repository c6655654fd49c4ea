use crate::errors::{AppError, AppResult};
use crate::ui::messages::{success, warning};
use rusqlite::{Connection, OptionalExtension, params};

/// Ensure that the `log` table exists. It also records applied migrations.
fn ensure_log_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn is_applied(conn: &Connection, version: &str) -> rusqlite::Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn mark_applied(conn: &Connection, version: &str, message: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
        params![version, message],
    )?;
    Ok(())
}

const BASE_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS employees (
        id          TEXT PRIMARY KEY,
        name        TEXT NOT NULL,
        email       TEXT,
        role        TEXT NOT NULL DEFAULT 'other',
        is_active   INTEGER NOT NULL DEFAULT 1,
        created_at  TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS locations (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL UNIQUE,
        qr_token    TEXT
    );

    CREATE TABLE IF NOT EXISTS employee_locations (
        employee_id TEXT NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
        location_id INTEGER NOT NULL REFERENCES locations(id) ON DELETE CASCADE,
        position    INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (employee_id, location_id)
    );

    CREATE TABLE IF NOT EXISTS sessions (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        employee_id TEXT NOT NULL REFERENCES employees(id),
        clock_in    TEXT NOT NULL,
        clock_out   TEXT,
        status      TEXT NOT NULL CHECK(status IN ('open','closed')),
        location_id INTEGER REFERENCES locations(id) ON DELETE SET NULL,
        source      TEXT NOT NULL DEFAULT 'clock' CHECK(source IN ('clock','manual')),
        created_at  TEXT NOT NULL,
        CHECK (clock_out IS NULL OR clock_out >= clock_in),
        CHECK ((clock_out IS NULL) = (status = 'open'))
    );

    CREATE INDEX IF NOT EXISTS idx_sessions_employee_clock_in ON sessions(employee_id, clock_in);
    CREATE INDEX IF NOT EXISTS idx_sessions_location_clock_in ON sessions(location_id, clock_in);

    CREATE TABLE IF NOT EXISTS app_settings (
        id                   INTEGER PRIMARY KEY CHECK(id = 1),
        business_name        TEXT NOT NULL DEFAULT '',
        opening_time         TEXT NOT NULL DEFAULT '08:00',
        max_hours            REAL NOT NULL DEFAULT 12,
        qr_token             TEXT,
        selected_location_id INTEGER REFERENCES locations(id) ON DELETE SET NULL,
        updated_at           TEXT NOT NULL
    );
"#;

fn migrate_base_schema(conn: &Connection) -> AppResult<()> {
    let version = "20250301_0001_base_schema";
    if is_applied(conn, version)? {
        return Ok(());
    }

    conn.execute_batch(BASE_SCHEMA)?;
    mark_applied(conn, version, "Created employees, locations, sessions, app_settings")?;
    success(format!("Migration applied: {}", version));
    Ok(())
}

/// Push the single-open-session rule into the store.
///
/// The index cannot be built while an employee still has two open sessions,
/// so those are reported and left for an administrator to close.
fn migrate_one_open_session_index(conn: &Connection) -> AppResult<()> {
    let version = "20250410_0002_one_open_session_per_employee";
    if is_applied(conn, version)? {
        return Ok(());
    }

    let mut stmt = conn.prepare(
        "SELECT employee_id, COUNT(*) FROM sessions
         WHERE clock_out IS NULL
         GROUP BY employee_id
         HAVING COUNT(*) > 1",
    )?;
    let dupes: Vec<(String, i64)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<_>>()?;

    if !dupes.is_empty() {
        for (emp, n) in &dupes {
            warning(format!("Employee '{}' has {} open sessions", emp, n));
        }
        return Err(AppError::Migration(format!(
            "{}: close the duplicated open sessions with `turnqr session edit` and retry",
            version
        )));
    }

    conn.execute_batch(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_one_open
         ON sessions(employee_id) WHERE clock_out IS NULL;",
    )?;
    mark_applied(conn, version, "Unique open session per employee")?;
    success(format!("Migration applied: {}", version));
    Ok(())
}

/// Public entry point: run all pending migrations, oldest first.
pub fn run_pending_migrations(conn: &Connection) -> AppResult<()> {
    ensure_log_table(conn)?;
    migrate_base_schema(conn)?;
    migrate_one_open_session_index(conn)?;
    Ok(())
}
