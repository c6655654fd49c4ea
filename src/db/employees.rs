use crate::db::{collect_rows, from_row_error, malformed};
use crate::errors::AppResult;
use crate::models::employee::Employee;
use crate::models::role::Role;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

fn map_row(row: &Row) -> rusqlite::Result<Employee> {
    let role_raw: String = row.get("role")?;
    let role = Role::from_db_str(&role_raw).ok_or_else(|| malformed("role", &role_raw))?;
    let active: i64 = row.get("is_active")?;

    Ok(Employee {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        role,
        is_active: active != 0,
        locations: Vec::new(),
    })
}

fn load_locations(conn: &Connection, employee_id: &str) -> AppResult<Vec<i64>> {
    let mut stmt = conn.prepare_cached(
        "SELECT location_id FROM employee_locations
         WHERE employee_id = ?1
         ORDER BY position ASC, location_id ASC",
    )?;
    let rows = stmt.query_map([employee_id], |r| r.get(0))?;
    collect_rows(rows)
}

fn with_locations(conn: &Connection, mut list: Vec<Employee>) -> AppResult<Vec<Employee>> {
    for e in &mut list {
        e.locations = load_locations(conn, &e.id)?;
    }
    Ok(list)
}

pub fn insert_employee(
    conn: &Connection,
    e: &Employee,
    now: DateTime<Utc>,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO employees (id, name, email, role, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            e.id,
            e.name,
            e.email,
            e.role.to_db_str(),
            e.is_active as i64,
            now.to_rfc3339()
        ],
    )?;
    Ok(())
}

pub fn get_employee(conn: &Connection, id: &str) -> AppResult<Option<Employee>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, name, email, role, is_active FROM employees WHERE id = ?1",
    )?;
    let found = stmt
        .query_row([id], map_row)
        .optional()
        .map_err(from_row_error)?;

    match found {
        Some(mut e) => {
            e.locations = load_locations(conn, &e.id)?;
            Ok(Some(e))
        }
        None => Ok(None),
    }
}

/// All employees sorted by name.
pub fn list_employees(conn: &Connection) -> AppResult<Vec<Employee>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, role, is_active FROM employees
         ORDER BY name COLLATE NOCASE ASC, id ASC",
    )?;
    let rows = stmt.query_map([], map_row)?;
    let list = collect_rows(rows)?;
    with_locations(conn, list)
}

/// Employees assigned to a location, sorted by name.
pub fn list_by_location(conn: &Connection, location_id: i64) -> AppResult<Vec<Employee>> {
    let mut stmt = conn.prepare(
        "SELECT e.id, e.name, e.email, e.role, e.is_active
         FROM employees e
         JOIN employee_locations el ON el.employee_id = e.id
         WHERE el.location_id = ?1
         ORDER BY e.name COLLATE NOCASE ASC, e.id ASC",
    )?;
    let rows = stmt.query_map([location_id], map_row)?;
    let list = collect_rows(rows)?;
    with_locations(conn, list)
}

pub fn update_role(conn: &Connection, id: &str, role: Role) -> AppResult<usize> {
    Ok(conn.execute(
        "UPDATE employees SET role = ?1 WHERE id = ?2",
        params![role.to_db_str(), id],
    )?)
}

pub fn set_active(conn: &Connection, id: &str, active: bool) -> AppResult<usize> {
    Ok(conn.execute(
        "UPDATE employees SET is_active = ?1 WHERE id = ?2",
        params![active as i64, id],
    )?)
}

pub fn delete_employee(conn: &Connection, id: &str) -> AppResult<usize> {
    Ok(conn.execute("DELETE FROM employees WHERE id = ?1", [id])?)
}

/// Append a location to the employee's assignment list (no-op if present).
pub fn assign_location(conn: &Connection, employee_id: &str, location_id: i64) -> AppResult<bool> {
    let n = conn.execute(
        "INSERT OR IGNORE INTO employee_locations (employee_id, location_id, position)
         VALUES (?1, ?2,
                 (SELECT IFNULL(MAX(position), -1) + 1 FROM employee_locations WHERE employee_id = ?1))",
        params![employee_id, location_id],
    )?;
    Ok(n > 0)
}

pub fn unassign_location(conn: &Connection, employee_id: &str, location_id: i64) -> AppResult<bool> {
    let n = conn.execute(
        "DELETE FROM employee_locations WHERE employee_id = ?1 AND location_id = ?2",
        params![employee_id, location_id],
    )?;
    Ok(n > 0)
}
