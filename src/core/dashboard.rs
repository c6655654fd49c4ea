//! Manager overview of the selected location: who is working right now and
//! which shifts were probably left open.

use crate::core::lifecycle::SessionLogic;
use crate::db::{employees, locations, sessions, settings};
use crate::errors::{AppError, AppResult};
use crate::models::employee::Employee;
use crate::models::location::Location;
use crate::models::session::WorkSession;
use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;

#[derive(Debug, Clone)]
pub struct ActiveShift {
    pub session: WorkSession,
    pub employee_name: String,
    pub role: String,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub business_name: String,
    pub location: Option<Location>,
    pub roster_size: usize,
    pub active: Vec<ActiveShift>,
    pub forgotten: Vec<ActiveShift>,
    pub max_hours: f64,
}

impl Dashboard {
    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

pub struct DashboardLogic;

impl DashboardLogic {
    /// Build the overview for `location_id`, or for the selected location
    /// when `None`. Without any location the whole business is shown.
    pub fn build(
        conn: &Connection,
        location_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> AppResult<Dashboard> {
        let cfg = settings::load_settings(conn)?;
        let scope = location_id.or(cfg.selected_location_id);

        let location = match scope {
            Some(id) => Some(locations::get_location(conn, id)?.ok_or(AppError::LocationNotFound(id))?),
            None => None,
        };

        let roster = match scope {
            Some(id) => employees::list_by_location(conn, id)?,
            None => employees::list_employees(conn)?,
        };
        let everyone = employees::list_employees(conn)?;

        let open = sessions::list_open(conn, scope)?;
        let forgotten_ids: Vec<i64> = SessionLogic::forgotten_clock_outs(&open, now, cfg.max_hours)
            .iter()
            .map(|s| s.id)
            .collect();

        let mut active = Vec::new();
        let mut forgotten = Vec::new();
        for s in open {
            let shift = describe(s, &everyone, now);
            if forgotten_ids.contains(&shift.session.id) {
                forgotten.push(shift.clone());
            }
            active.push(shift);
        }

        Ok(Dashboard {
            business_name: cfg.business_name,
            location,
            roster_size: roster.len(),
            active,
            forgotten,
            max_hours: cfg.max_hours,
        })
    }
}

fn describe(session: WorkSession, everyone: &[Employee], now: DateTime<Utc>) -> ActiveShift {
    let emp = everyone.iter().find(|e| e.id == session.employee_id);
    ActiveShift {
        employee_name: emp
            .map(|e| e.name.clone())
            .unwrap_or_else(|| crate::core::aggregate::UNNAMED.to_string()),
        role: emp
            .map(|e| e.role.label().to_string())
            .unwrap_or_else(|| crate::core::aggregate::NO_ROLE.to_string()),
        elapsed: session.elapsed(now),
        session,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::employees::EmployeeLogic;
    use crate::core::locations::LocationLogic;
    use crate::db::pool::DbPool;
    use crate::models::role::Role;
    use chrono::TimeZone;

    #[test]
    fn lists_active_and_forgotten_shifts_for_location() {
        let mut pool = DbPool::in_memory().unwrap();
        let t = |h| Utc.with_ymd_and_hms(2024, 4, 2, h, 0, 0).unwrap();

        let centro = LocationLogic::add(&mut pool, "Centro", true, "boss").unwrap();
        let playa = LocationLogic::add(&mut pool, "Playa", true, "boss").unwrap();
        for (id, loc) in [("ana", centro.id), ("bob", centro.id), ("eva", playa.id)] {
            EmployeeLogic::add(&mut pool, id, None, None, Role::Cook, t(0)).unwrap();
            EmployeeLogic::assign(&mut pool, id, loc, "boss").unwrap();
        }

        SessionLogic::clock_in(&mut pool, "ana", Some(centro.id), t(1)).unwrap();
        SessionLogic::clock_in(&mut pool, "bob", Some(centro.id), t(10)).unwrap();
        SessionLogic::clock_in(&mut pool, "eva", Some(playa.id), t(2)).unwrap();

        let d = DashboardLogic::build(&pool.conn, Some(centro.id), t(14)).unwrap();
        assert_eq!(d.roster_size, 2);
        assert_eq!(d.active_count(), 2);
        assert_eq!(d.forgotten.len(), 1);
        assert_eq!(d.forgotten[0].session.employee_id, "ana");
        assert_eq!(d.active[0].elapsed, Duration::hours(13));
    }

    #[test]
    fn unknown_location_is_not_found() {
        let pool = DbPool::in_memory().unwrap();
        assert!(matches!(
            DashboardLogic::build(&pool.conn, Some(3), Utc::now()),
            Err(AppError::LocationNotFound(3))
        ));
    }
}
