use crate::db::pool::DbPool;
use crate::utils::colors::{CYAN, GREEN, GREY, RESET, YELLOW};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use std::fs;

pub fn print_db_info(pool: &mut DbPool, db_path: &str) -> rusqlite::Result<()> {
    println!();

    //
    // 1) FILE SIZE
    //
    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let file_mb = (file_size as f64) / (1024.0 * 1024.0);

    println!("{}• File:{} {}{}{}", CYAN, RESET, YELLOW, db_path, RESET);
    println!("{}• Size:{} {:.2} MB", CYAN, RESET, file_mb);

    //
    // 2) COUNTS
    //
    let count = |sql: &str| -> rusqlite::Result<i64> { pool.conn.query_row(sql, [], |r| r.get(0)) };
    let employees = count("SELECT COUNT(*) FROM employees")?;
    let locations = count("SELECT COUNT(*) FROM locations")?;
    let sessions = count("SELECT COUNT(*) FROM sessions")?;
    let open = count("SELECT COUNT(*) FROM sessions WHERE clock_out IS NULL")?;

    println!("{}• Employees:{} {}{}{}", CYAN, RESET, GREEN, employees, RESET);
    println!("{}• Locations:{} {}{}{}", CYAN, RESET, GREEN, locations, RESET);
    println!(
        "{}• Sessions:{} {}{}{} ({} open)",
        CYAN, RESET, GREEN, sessions, RESET, open
    );

    //
    // 3) DATE RANGE
    //
    let first: Option<String> = pool
        .conn
        .query_row(
            "SELECT clock_in FROM sessions ORDER BY clock_in ASC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    let last: Option<String> = pool
        .conn
        .query_row(
            "SELECT clock_in FROM sessions ORDER BY clock_in DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    let fmt_first = first
        .clone()
        .unwrap_or_else(|| format!("{GREY}--{RESET}"));
    let fmt_last = last.clone().unwrap_or_else(|| format!("{GREY}--{RESET}"));

    println!("{}• Clock-in range:{}", CYAN, RESET);
    println!("    from: {}", fmt_first);
    println!("    to:   {}", fmt_last);

    //
    // 4) AVERAGE SESSIONS/DAY
    //
    if let (Some(f), Some(l)) = (first, last) {
        let d1 = parse_ts(&f)?;
        let d2 = parse_ts(&l)?;
        let days = (d2 - d1).num_days().max(1);

        let avg = sessions as f64 / days as f64;
        println!("{}• Average sessions/day:{} {:.2}", CYAN, RESET, avg);
    }

    println!();
    Ok(())
}

fn parse_ts(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Problems found by SQLite's own checks plus shifts left open by
/// deactivated employees. Empty when the database is healthy.
pub fn health_problems(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut problems = Vec::new();

    let mut stmt = conn.prepare("PRAGMA integrity_check")?;
    for row in stmt.query_map([], |r| r.get::<_, String>(0))? {
        let line = row?;
        if line != "ok" {
            problems.push(format!("integrity: {line}"));
        }
    }

    let mut stmt = conn.prepare("PRAGMA foreign_key_check")?;
    let dangling = stmt.query_map([], |r| {
        Ok((r.get::<_, String>(0)?, r.get::<_, Option<i64>>(1)?, r.get::<_, String>(2)?))
    })?;
    for row in dangling {
        let (table, rowid, parent) = row?;
        problems.push(format!(
            "{table} row {} points to a missing {parent} record",
            rowid.map(|r| r.to_string()).unwrap_or_else(|| "?".into())
        ));
    }

    let mut stmt = conn.prepare(
        "SELECT s.id, e.id FROM sessions s JOIN employees e ON e.id = s.employee_id
         WHERE s.clock_out IS NULL AND e.is_active = 0",
    )?;
    for row in stmt.query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)))? {
        let (session, employee) = row?;
        problems.push(format!(
            "session #{session} is open but employee '{employee}' is deactivated"
        ));
    }

    Ok(problems)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::employees::EmployeeLogic;
    use crate::core::lifecycle::SessionLogic;
    use crate::models::role::Role;
    use chrono::TimeZone;

    #[test]
    fn fresh_database_is_healthy() {
        let pool = DbPool::in_memory().unwrap();
        assert!(health_problems(&pool.conn).unwrap().is_empty());
    }

    #[test]
    fn open_shift_of_deactivated_employee_is_reported() {
        let mut pool = DbPool::in_memory().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
        EmployeeLogic::add(&mut pool, "ana", Some("Ana"), None, Role::Cook, now).unwrap();
        SessionLogic::clock_in(&mut pool, "ana", None, now).unwrap();
        EmployeeLogic::set_active(&mut pool, "ana", false, "admin").unwrap();

        let problems = health_problems(&pool.conn).unwrap();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("'ana' is deactivated"));
    }
}
