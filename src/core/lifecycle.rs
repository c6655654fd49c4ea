//! Clock-in / clock-out state machine and the administrator overrides.
//!
//! Every write runs inside an IMMEDIATE transaction so two terminals racing
//! on the same employee serialise at the SQLite write lock. The partial unique
//! index on open sessions backs the rule up at the store level.

use crate::db::log::{audit_message, ttlog};
use crate::db::pool::DbPool;
use crate::db::sessions::{self, NewSession, SessionQuery};
use crate::db::{employees, is_unique_violation, locations};
use crate::errors::{AppError, AppResult};
use crate::models::session::{SessionSource, WorkSession, to_db_timestamp};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, TransactionBehavior};

/// Result of a clock-in request.
#[derive(Debug, Clone, PartialEq)]
pub enum ClockIn {
    /// A new open session was created.
    Opened(WorkSession),
    /// The employee was already clocked in; the existing session is returned unchanged.
    AlreadyOpen(WorkSession),
}

impl ClockIn {
    pub fn session(&self) -> &WorkSession {
        match self {
            ClockIn::Opened(s) | ClockIn::AlreadyOpen(s) => s,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, ClockIn::Opened(_))
    }
}

/// Retroactive session entered by an administrator.
#[derive(Debug, Clone)]
pub struct ManualSession<'a> {
    pub employee_id: &'a str,
    pub clock_in: DateTime<Utc>,
    pub clock_out: DateTime<Utc>,
    pub location_id: Option<i64>,
    pub actor: &'a str,
    pub reason: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct ManualOutcome {
    pub session: WorkSession,
    /// Existing sessions of the same employee the new one overlaps.
    pub overlaps: Vec<WorkSession>,
}

/// Changes to an existing session. `None` keeps the stored value;
/// `clock_out: Some(None)` reopens the session.
#[derive(Debug, Clone, Default)]
pub struct SessionEdit {
    pub clock_in: Option<DateTime<Utc>>,
    pub clock_out: Option<Option<DateTime<Utc>>>,
}

impl SessionEdit {
    pub fn is_empty(&self) -> bool {
        self.clock_in.is_none() && self.clock_out.is_none()
    }
}

fn fmt_span(clock_in: &DateTime<Utc>, clock_out: Option<&DateTime<Utc>>) -> String {
    let out = clock_out
        .map(to_db_timestamp)
        .unwrap_or_else(|| "open".to_string());
    format!("{} -> {}", to_db_timestamp(clock_in), out)
}

fn check_order(clock_in: &DateTime<Utc>, clock_out: Option<&DateTime<Utc>>) -> AppResult<()> {
    if let Some(out) = clock_out
        && out < clock_in
    {
        return Err(AppError::Validation(format!(
            "clock-out {} is before clock-in {}",
            to_db_timestamp(out),
            to_db_timestamp(clock_in)
        )));
    }
    Ok(())
}

fn require_employee(conn: &Connection, employee_id: &str) -> AppResult<()> {
    match employees::get_employee(conn, employee_id)? {
        Some(_) => Ok(()),
        None => Err(AppError::EmployeeNotFound(employee_id.to_string())),
    }
}

fn require_location(conn: &Connection, location_id: Option<i64>) -> AppResult<()> {
    if let Some(id) = location_id
        && locations::get_location(conn, id)?.is_none()
    {
        return Err(AppError::LocationNotFound(id));
    }
    Ok(())
}

pub struct SessionLogic;

impl SessionLogic {
    /// Open a session for the employee, or return the one already open.
    ///
    /// The token check happens before this call.
    pub fn clock_in(
        pool: &mut DbPool,
        employee_id: &str,
        location_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> AppResult<ClockIn> {
        let tx = pool
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if let Some(open) = sessions::find_open(&tx, employee_id)? {
            return Ok(ClockIn::AlreadyOpen(open));
        }

        require_employee(&tx, employee_id)?;
        require_location(&tx, location_id)?;

        let new = NewSession {
            employee_id,
            clock_in: now,
            clock_out: None,
            location_id,
            source: SessionSource::Clock,
        };

        let id = match sessions::insert_session(&tx, &new, now) {
            Ok(id) => id,
            Err(e) if is_unique_violation(&e) => {
                // another writer opened a session first
                let winner = sessions::find_open(&tx, employee_id)?
                    .ok_or_else(|| AppError::OpenSessionConflict(employee_id.to_string()))?;
                return Ok(ClockIn::AlreadyOpen(winner));
            }
            Err(e) => return Err(e.into()),
        };

        let session = sessions::get_session(&tx, id)?.ok_or(AppError::SessionNotFound(id))?;
        ttlog(
            &tx,
            "clock_in",
            employee_id,
            &format!("Session #{} opened at {}", id, to_db_timestamp(&now)),
        )?;
        tx.commit()?;

        Ok(ClockIn::Opened(session))
    }

    /// Close the open session. `None` when there is nothing to close; in that
    /// case nothing is written.
    pub fn clock_out(
        pool: &mut DbPool,
        employee_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<WorkSession>> {
        let tx = pool
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(open) = sessions::find_open(&tx, employee_id)? else {
            return Ok(None);
        };
        check_order(&open.clock_in, Some(&now))?;

        sessions::close_open(&tx, employee_id, now)?;
        let closed = sessions::get_session(&tx, open.id)?.ok_or(AppError::SessionNotFound(open.id))?;

        ttlog(
            &tx,
            "clock_out",
            employee_id,
            &format!(
                "Session #{} closed at {} ({} min)",
                closed.id,
                to_db_timestamp(&now),
                closed.elapsed(now).num_minutes()
            ),
        )?;
        tx.commit()?;

        Ok(Some(closed))
    }

    /// Insert a closed session on behalf of an employee.
    ///
    /// Overlaps with existing sessions are accepted and reported back; the
    /// audit row names the actor, the reason and the overlapped ids.
    pub fn manual_session(
        pool: &mut DbPool,
        req: &ManualSession<'_>,
        now: DateTime<Utc>,
    ) -> AppResult<ManualOutcome> {
        check_order(&req.clock_in, Some(&req.clock_out))?;

        let tx = pool
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        require_employee(&tx, req.employee_id)?;
        require_location(&tx, req.location_id)?;

        let candidates = sessions::list_sessions(
            &tx,
            &SessionQuery {
                employee_id: Some(req.employee_id),
                from: Some(req.clock_in),
                to: Some(req.clock_out),
                overlap: true,
                ..Default::default()
            },
        )?;

        let new = NewSession {
            employee_id: req.employee_id,
            clock_in: req.clock_in,
            clock_out: Some(req.clock_out),
            location_id: req.location_id,
            source: SessionSource::Manual,
        };
        let id = sessions::insert_session(&tx, &new, now)?;
        let session = sessions::get_session(&tx, id)?.ok_or(AppError::SessionNotFound(id))?;

        let overlaps: Vec<WorkSession> = candidates
            .into_iter()
            .filter(|s| s.overlaps(&session, now))
            .collect();

        let mut what = format!(
            "Manual session #{} ({}) for {}",
            id,
            fmt_span(&session.clock_in, session.clock_out.as_ref()),
            req.employee_id
        );
        if !overlaps.is_empty() {
            let ids: Vec<String> = overlaps.iter().map(|s| format!("#{}", s.id)).collect();
            what.push_str(&format!(", overlapping {}", ids.join(", ")));
        }
        ttlog(
            &tx,
            "session_add",
            req.employee_id,
            &audit_message(req.actor, &what, req.reason),
        )?;
        tx.commit()?;

        Ok(ManualOutcome { session, overlaps })
    }

    /// Administrator correction of a session's times.
    ///
    /// Status always follows the resulting clock-out. Reopening is refused
    /// while the employee has another open session.
    pub fn edit_session(
        pool: &mut DbPool,
        session_id: i64,
        edit: &SessionEdit,
        actor: &str,
        reason: Option<&str>,
    ) -> AppResult<WorkSession> {
        let tx = pool
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current =
            sessions::get_session(&tx, session_id)?.ok_or(AppError::SessionNotFound(session_id))?;

        let clock_in = edit.clock_in.unwrap_or(current.clock_in);
        let clock_out = match edit.clock_out {
            Some(v) => v,
            None => current.clock_out,
        };
        check_order(&clock_in, clock_out.as_ref())?;

        if clock_out.is_none()
            && let Some(other) = sessions::find_open(&tx, &current.employee_id)?
            && other.id != current.id
        {
            return Err(AppError::OpenSessionConflict(current.employee_id));
        }

        match sessions::update_times(&tx, session_id, clock_in, clock_out) {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::OpenSessionConflict(current.employee_id));
            }
            Err(e) => return Err(e.into()),
        }

        let updated =
            sessions::get_session(&tx, session_id)?.ok_or(AppError::SessionNotFound(session_id))?;

        let what = format!(
            "Session #{} edited: {} => {}",
            session_id,
            fmt_span(&current.clock_in, current.clock_out.as_ref()),
            fmt_span(&updated.clock_in, updated.clock_out.as_ref())
        );
        ttlog(
            &tx,
            "session_edit",
            &current.employee_id,
            &audit_message(actor, &what, reason),
        )?;
        tx.commit()?;

        Ok(updated)
    }

    /// Hard delete. Returns the removed row.
    pub fn delete_session(
        pool: &mut DbPool,
        session_id: i64,
        actor: &str,
        reason: Option<&str>,
    ) -> AppResult<WorkSession> {
        let tx = pool
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let gone =
            sessions::get_session(&tx, session_id)?.ok_or(AppError::SessionNotFound(session_id))?;
        sessions::delete_session(&tx, session_id)?;

        let what = format!(
            "Session #{} ({}) deleted",
            session_id,
            fmt_span(&gone.clock_in, gone.clock_out.as_ref())
        );
        ttlog(
            &tx,
            "session_del",
            &gone.employee_id,
            &audit_message(actor, &what, reason),
        )?;
        tx.commit()?;

        Ok(gone)
    }

    pub fn current_open_session(conn: &Connection, employee_id: &str) -> AppResult<Option<WorkSession>> {
        sessions::find_open(conn, employee_id)
    }

    /// All sessions of the employee, newest first.
    pub fn history(conn: &Connection, employee_id: &str) -> AppResult<Vec<WorkSession>> {
        sessions::history(conn, employee_id)
    }

    /// Open sessions that have run longer than `max_hours`.
    pub fn forgotten_clock_outs(
        open: &[WorkSession],
        now: DateTime<Utc>,
        max_hours: f64,
    ) -> Vec<WorkSession> {
        let limit = Duration::milliseconds((max_hours * 3_600_000.0).round() as i64);
        open.iter()
            .filter(|s| s.is_open() && s.elapsed(now) > limit)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::log::load_log;
    use crate::models::employee::Employee;
    use crate::models::role::Role;
    use chrono::TimeZone;

    fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, h, m, 0).unwrap()
    }

    fn pool_with(ids: &[&str]) -> DbPool {
        let pool = DbPool::in_memory().unwrap();
        for id in ids {
            let e = Employee {
                id: id.to_string(),
                name: id.to_string(),
                email: None,
                role: Role::Cook,
                is_active: true,
                locations: vec![],
            };
            employees::insert_employee(&pool.conn, &e, at(1, 0, 0)).unwrap();
        }
        pool
    }

    fn open_count(pool: &DbPool, emp: &str) -> i64 {
        pool.conn
            .query_row(
                "SELECT COUNT(*) FROM sessions WHERE employee_id = ?1 AND clock_out IS NULL",
                [emp],
                |r| r.get(0),
            )
            .unwrap()
    }

    #[test]
    fn clock_in_twice_returns_the_same_session() {
        let mut pool = pool_with(&["ana"]);

        let first = SessionLogic::clock_in(&mut pool, "ana", None, at(4, 9, 0)).unwrap();
        let second = SessionLogic::clock_in(&mut pool, "ana", None, at(4, 9, 5)).unwrap();

        assert!(first.is_new());
        assert!(!second.is_new());
        assert_eq!(first.session(), second.session());
        assert_eq!(second.session().clock_in, at(4, 9, 0));
        assert_eq!(open_count(&pool, "ana"), 1);
    }

    #[test]
    fn clock_in_unknown_employee_fails() {
        let mut pool = pool_with(&[]);
        let err = SessionLogic::clock_in(&mut pool, "ghost", None, at(4, 9, 0)).unwrap_err();
        assert!(matches!(err, AppError::EmployeeNotFound(_)));
    }

    #[test]
    fn store_refuses_second_open_row() {
        let pool = pool_with(&["ana"]);
        let new = NewSession {
            employee_id: "ana",
            clock_in: at(4, 9, 0),
            clock_out: None,
            location_id: None,
            source: SessionSource::Clock,
        };
        sessions::insert_session(&pool.conn, &new, at(4, 9, 0)).unwrap();
        let err = sessions::insert_session(&pool.conn, &new, at(4, 9, 0)).unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[test]
    fn clock_out_without_open_session_is_a_no_op() {
        let mut pool = pool_with(&["ana"]);
        let before = load_log(&pool.conn, None).unwrap().len();

        assert!(SessionLogic::clock_out(&mut pool, "ana", at(4, 17, 0)).unwrap().is_none());

        let n: i64 = pool
            .conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 0);
        assert_eq!(load_log(&pool.conn, None).unwrap().len(), before);
    }

    #[test]
    fn clock_out_closes_and_derives_status() {
        let mut pool = pool_with(&["ana"]);
        SessionLogic::clock_in(&mut pool, "ana", None, at(4, 9, 0)).unwrap();

        let closed = SessionLogic::clock_out(&mut pool, "ana", at(4, 17, 0))
            .unwrap()
            .unwrap();
        assert_eq!(closed.clock_out, Some(at(4, 17, 0)));
        assert_eq!(closed.status, crate::models::session::SessionStatus::Closed);
        assert!(SessionLogic::current_open_session(&pool.conn, "ana").unwrap().is_none());
    }

    #[test]
    fn manual_session_reports_overlaps_and_audits() {
        let mut pool = pool_with(&["ana"]);
        SessionLogic::clock_in(&mut pool, "ana", None, at(4, 9, 0)).unwrap();
        SessionLogic::clock_out(&mut pool, "ana", at(4, 13, 0)).unwrap();

        let out = SessionLogic::manual_session(
            &mut pool,
            &ManualSession {
                employee_id: "ana",
                clock_in: at(4, 12, 0),
                clock_out: at(4, 18, 0),
                location_id: None,
                actor: "boss",
                reason: Some("forgot the QR"),
            },
            at(5, 8, 0),
        )
        .unwrap();

        assert_eq!(out.session.source, SessionSource::Manual);
        assert_eq!(out.overlaps.len(), 1);

        let audit = load_log(&pool.conn, Some("session_add")).unwrap();
        assert_eq!(audit.len(), 1);
        assert!(audit[0].message.contains("by boss"));
        assert!(audit[0].message.contains("forgot the QR"));
    }

    #[test]
    fn manual_session_rejects_inverted_interval() {
        let mut pool = pool_with(&["ana"]);
        let err = SessionLogic::manual_session(
            &mut pool,
            &ManualSession {
                employee_id: "ana",
                clock_in: at(4, 18, 0),
                clock_out: at(4, 9, 0),
                location_id: None,
                actor: "boss",
                reason: None,
            },
            at(5, 8, 0),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn reopening_is_refused_while_another_session_is_open() {
        let mut pool = pool_with(&["ana"]);
        SessionLogic::clock_in(&mut pool, "ana", None, at(4, 9, 0)).unwrap();
        let old = SessionLogic::clock_out(&mut pool, "ana", at(4, 17, 0))
            .unwrap()
            .unwrap();
        SessionLogic::clock_in(&mut pool, "ana", None, at(5, 9, 0)).unwrap();

        let edit = SessionEdit {
            clock_out: Some(None),
            ..Default::default()
        };
        let err = SessionLogic::edit_session(&mut pool, old.id, &edit, "boss", None).unwrap_err();
        assert!(matches!(err, AppError::OpenSessionConflict(_)));
        assert_eq!(open_count(&pool, "ana"), 1);
    }

    #[test]
    fn edit_closes_open_session_and_validates_order() {
        let mut pool = pool_with(&["ana"]);
        let s = SessionLogic::clock_in(&mut pool, "ana", None, at(4, 9, 0))
            .unwrap()
            .session()
            .clone();

        let bad = SessionEdit {
            clock_out: Some(Some(at(4, 8, 0))),
            ..Default::default()
        };
        assert!(SessionLogic::edit_session(&mut pool, s.id, &bad, "boss", None).is_err());

        let good = SessionEdit {
            clock_out: Some(Some(at(4, 16, 30))),
            ..Default::default()
        };
        let edited = SessionLogic::edit_session(&mut pool, s.id, &good, "boss", Some("late fix")).unwrap();
        assert!(!edited.is_open());
        assert_eq!(load_log(&pool.conn, Some("session_edit")).unwrap().len(), 1);
    }

    #[test]
    fn delete_missing_session_is_not_found() {
        let mut pool = pool_with(&["ana"]);
        let err = SessionLogic::delete_session(&mut pool, 42, "boss", None).unwrap_err();
        assert!(matches!(err, AppError::SessionNotFound(42)));
    }

    #[test]
    fn history_is_newest_first() {
        let mut pool = pool_with(&["ana"]);
        for d in [4, 5, 6] {
            SessionLogic::clock_in(&mut pool, "ana", None, at(d, 9, 0)).unwrap();
            SessionLogic::clock_out(&mut pool, "ana", at(d, 17, 0)).unwrap();
        }
        let h = SessionLogic::history(&pool.conn, "ana").unwrap();
        let days: Vec<_> = h.iter().map(|s| s.clock_in).collect();
        assert_eq!(days, vec![at(6, 9, 0), at(5, 9, 0), at(4, 9, 0)]);
    }

    #[test]
    fn forgotten_clock_outs_use_threshold() {
        let mut pool = pool_with(&["ana", "bob"]);
        SessionLogic::clock_in(&mut pool, "ana", None, at(4, 6, 0)).unwrap();
        SessionLogic::clock_in(&mut pool, "bob", None, at(4, 15, 0)).unwrap();

        let open = sessions::list_open(&pool.conn, None).unwrap();
        let late = SessionLogic::forgotten_clock_outs(&open, at(4, 19, 0), 12.0);
        assert_eq!(late.len(), 1);
        assert_eq!(late[0].employee_id, "ana");
    }
}
