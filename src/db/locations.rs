use crate::db::{collect_rows, from_row_error};
use crate::errors::AppResult;
use crate::models::location::Location;
use rusqlite::{Connection, OptionalExtension, Row, params};

fn map_row(row: &Row) -> rusqlite::Result<Location> {
    Ok(Location {
        id: row.get("id")?,
        name: row.get("name")?,
        qr_token: row.get("qr_token")?,
    })
}

pub fn insert_location(conn: &Connection, name: &str, qr_token: Option<&str>) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO locations (name, qr_token) VALUES (?1, ?2)",
        params![name, qr_token],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_location(conn: &Connection, id: i64) -> AppResult<Option<Location>> {
    let mut stmt = conn.prepare_cached("SELECT id, name, qr_token FROM locations WHERE id = ?1")?;
    stmt.query_row([id], map_row)
        .optional()
        .map_err(from_row_error)
}

/// All locations ordered by name.
pub fn list_locations(conn: &Connection) -> AppResult<Vec<Location>> {
    let mut stmt =
        conn.prepare("SELECT id, name, qr_token FROM locations ORDER BY name COLLATE NOCASE ASC")?;
    let rows = stmt.query_map([], map_row)?;
    collect_rows(rows)
}

pub fn set_token(conn: &Connection, id: i64, token: Option<&str>) -> AppResult<usize> {
    Ok(conn.execute(
        "UPDATE locations SET qr_token = ?1 WHERE id = ?2",
        params![token, id],
    )?)
}
