//! Session store: typed access to the `sessions` table.

use crate::db::{collect_rows, from_row_error, malformed};
use crate::errors::AppResult;
use crate::models::session::{
    SessionSource, SessionStatus, WorkSession, from_db_timestamp, to_db_timestamp,
};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

const COLUMNS: &str = "id, employee_id, clock_in, clock_out, status, location_id, source, created_at";

/// Row to insert. Status is derived from `clock_out`.
#[derive(Debug, Clone)]
pub struct NewSession<'a> {
    pub employee_id: &'a str,
    pub clock_in: DateTime<Utc>,
    pub clock_out: Option<DateTime<Utc>>,
    pub location_id: Option<i64>,
    pub source: SessionSource,
}

/// Filter for range reads. Timestamps are compared on the stored text form.
#[derive(Debug, Clone, Default)]
pub struct SessionQuery<'a> {
    pub employee_id: Option<&'a str>,
    pub location_id: Option<i64>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// `false`: clock-in must fall inside `[from, to]`.
    /// `true`: any overlap with `[from, to]` qualifies.
    pub overlap: bool,
}

fn parse_ts(column: &str, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    from_db_timestamp(raw).map_err(|_| malformed(column, raw))
}

pub fn map_row(row: &Row) -> rusqlite::Result<WorkSession> {
    let clock_in_raw: String = row.get("clock_in")?;
    let clock_out_raw: Option<String> = row.get("clock_out")?;
    let status_raw: String = row.get("status")?;
    let source_raw: String = row.get("source")?;
    let created_raw: String = row.get("created_at")?;

    let clock_in = parse_ts("clock_in", &clock_in_raw)?;
    let clock_out = match clock_out_raw {
        Some(raw) => Some(parse_ts("clock_out", &raw)?),
        None => None,
    };

    let status =
        SessionStatus::from_db_str(&status_raw).ok_or_else(|| malformed("status", &status_raw))?;
    if status != SessionStatus::for_clock_out(clock_out.as_ref()) {
        return Err(malformed("status", &status_raw));
    }
    if let Some(out) = clock_out
        && out < clock_in
    {
        return Err(malformed("clock_out", &to_db_timestamp(&out)));
    }

    let source =
        SessionSource::from_db_str(&source_raw).ok_or_else(|| malformed("source", &source_raw))?;

    Ok(WorkSession {
        id: row.get("id")?,
        employee_id: row.get("employee_id")?,
        clock_in,
        clock_out,
        status,
        location_id: row.get("location_id")?,
        source,
        created_at: parse_ts("created_at", &created_raw)?,
    })
}

/// Insert a row and return its id. The raw rusqlite error is kept so callers
/// can tell a unique-index violation (open-session race) from other failures.
pub fn insert_session(conn: &Connection, s: &NewSession<'_>, now: DateTime<Utc>) -> rusqlite::Result<i64> {
    let status = SessionStatus::for_clock_out(s.clock_out.as_ref());
    conn.execute(
        "INSERT INTO sessions (employee_id, clock_in, clock_out, status, location_id, source, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            s.employee_id,
            to_db_timestamp(&s.clock_in),
            s.clock_out.as_ref().map(to_db_timestamp),
            status.to_db_str(),
            s.location_id,
            s.source.to_db_str(),
            to_db_timestamp(&now),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_session(conn: &Connection, id: i64) -> AppResult<Option<WorkSession>> {
    let sql = format!("SELECT {COLUMNS} FROM sessions WHERE id = ?1");
    let mut stmt = conn.prepare_cached(&sql)?;
    stmt.query_row([id], map_row)
        .optional()
        .map_err(from_row_error)
}

/// The employee's open session, newest first if the store ever holds more
/// than one (it cannot once the unique index is in place).
pub fn find_open(conn: &Connection, employee_id: &str) -> AppResult<Option<WorkSession>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM sessions
         WHERE employee_id = ?1 AND clock_out IS NULL
         ORDER BY clock_in DESC
         LIMIT 1"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    stmt.query_row([employee_id], map_row)
        .optional()
        .map_err(from_row_error)
}

/// Close the open session of an employee. Returns the number of rows changed.
pub fn close_open(conn: &Connection, employee_id: &str, at: DateTime<Utc>) -> AppResult<usize> {
    let n = conn.execute(
        "UPDATE sessions
         SET clock_out = ?1, status = 'closed'
         WHERE employee_id = ?2 AND clock_out IS NULL",
        params![to_db_timestamp(&at), employee_id],
    )?;
    Ok(n)
}

pub fn update_times(
    conn: &Connection,
    id: i64,
    clock_in: DateTime<Utc>,
    clock_out: Option<DateTime<Utc>>,
) -> rusqlite::Result<usize> {
    let status = SessionStatus::for_clock_out(clock_out.as_ref());
    conn.execute(
        "UPDATE sessions SET clock_in = ?1, clock_out = ?2, status = ?3 WHERE id = ?4",
        params![
            to_db_timestamp(&clock_in),
            clock_out.as_ref().map(to_db_timestamp),
            status.to_db_str(),
            id
        ],
    )
}

pub fn delete_session(conn: &Connection, id: i64) -> AppResult<usize> {
    Ok(conn.execute("DELETE FROM sessions WHERE id = ?1", [id])?)
}

pub fn history(conn: &Connection, employee_id: &str) -> AppResult<Vec<WorkSession>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM sessions
         WHERE employee_id = ?1
         ORDER BY clock_in DESC"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map([employee_id], map_row)?;
    collect_rows(rows)
}

/// Open sessions, optionally limited to one location, oldest first.
pub fn list_open(conn: &Connection, location_id: Option<i64>) -> AppResult<Vec<WorkSession>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM sessions
         WHERE clock_out IS NULL AND (?1 IS NULL OR location_id = ?1)
         ORDER BY clock_in ASC"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map(params![location_id], map_row)?;
    collect_rows(rows)
}

/// Sessions matching the query, in clock-in order.
pub fn list_sessions(conn: &Connection, q: &SessionQuery<'_>) -> AppResult<Vec<WorkSession>> {
    let from = q.from.as_ref().map(to_db_timestamp);
    let to = q.to.as_ref().map(to_db_timestamp);

    let window = if q.overlap {
        "(?3 IS NULL OR clock_out IS NULL OR clock_out >= ?3)
         AND (?4 IS NULL OR clock_in <= ?4)"
    } else {
        "(?3 IS NULL OR clock_in >= ?3)
         AND (?4 IS NULL OR clock_in <= ?4)"
    };

    let sql = format!(
        "SELECT {COLUMNS} FROM sessions
         WHERE (?1 IS NULL OR employee_id = ?1)
           AND (?2 IS NULL OR location_id = ?2)
           AND {window}
         ORDER BY clock_in ASC, id ASC"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![q.employee_id, q.location_id, from, to], map_row)?;
    collect_rows(rows)
}

pub fn count_for_employee(conn: &Connection, employee_id: &str) -> AppResult<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM sessions WHERE employee_id = ?1",
        [employee_id],
        |r| r.get(0),
    )?)
}
