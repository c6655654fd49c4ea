use crate::db::employees as store;
use crate::db::log::{audit_message, ttlog};
use crate::db::pool::DbPool;
use crate::db::{is_primary_key_violation, is_unique_violation, locations, sessions};
use crate::errors::{AppError, AppResult};
use crate::models::employee::Employee;
use crate::models::role::Role;
use chrono::{DateTime, Utc};
use rusqlite::Connection;

/// Roster management.
pub struct EmployeeLogic;

fn require(conn: &Connection, id: &str) -> AppResult<Employee> {
    store::get_employee(conn, id)?.ok_or_else(|| AppError::EmployeeNotFound(id.to_string()))
}

impl EmployeeLogic {
    pub fn add(
        pool: &mut DbPool,
        id: &str,
        name: Option<&str>,
        email: Option<&str>,
        role: Role,
        now: DateTime<Utc>,
    ) -> AppResult<Employee> {
        let id = id.trim();
        if id.is_empty() {
            return Err(AppError::Validation("employee id cannot be empty".into()));
        }

        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Employee::default_name(id, email));

        let emp = Employee {
            id: id.to_string(),
            name,
            email: email.map(str::to_string),
            role,
            is_active: true,
            locations: Vec::new(),
        };

        match store::insert_employee(&pool.conn, &emp, now) {
            Ok(()) => {}
            Err(e) if is_unique_violation(&e) || is_primary_key_violation(&e) => {
                return Err(AppError::Validation(format!("employee '{}' already exists", id)));
            }
            Err(e) => return Err(e.into()),
        }

        ttlog(
            &pool.conn,
            "employee_add",
            id,
            &format!("{} ({})", emp.name, emp.role.label()),
        )?;
        Ok(emp)
    }

    /// Make sure the principal has a roster record before it clocks in.
    /// Returns the record and whether it was just created.
    pub fn ensure(
        pool: &mut DbPool,
        id: &str,
        email: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<(Employee, bool)> {
        if let Some(e) = store::get_employee(&pool.conn, id)? {
            return Ok((e, false));
        }
        let e = Self::add(pool, id, None, email, Role::default(), now)?;
        Ok((e, true))
    }

    pub fn get(conn: &Connection, id: &str) -> AppResult<Employee> {
        require(conn, id)
    }

    /// Sorted by name; restricted to one location when given.
    pub fn list(conn: &Connection, location_id: Option<i64>) -> AppResult<Vec<Employee>> {
        match location_id {
            Some(loc) => store::list_by_location(conn, loc),
            None => store::list_employees(conn),
        }
    }

    pub fn set_role(pool: &mut DbPool, id: &str, role: Role, actor: &str) -> AppResult<Employee> {
        let before = require(&pool.conn, id)?;
        store::update_role(&pool.conn, id, role)?;
        ttlog(
            &pool.conn,
            "employee_role",
            id,
            &audit_message(
                actor,
                &format!("Role {} => {}", before.role.label(), role.label()),
                None,
            ),
        )?;
        require(&pool.conn, id)
    }

    pub fn set_active(pool: &mut DbPool, id: &str, active: bool, actor: &str) -> AppResult<Employee> {
        require(&pool.conn, id)?;
        store::set_active(&pool.conn, id, active)?;
        let what = if active { "Activated" } else { "Deactivated" };
        ttlog(&pool.conn, "employee_active", id, &audit_message(actor, what, None))?;
        require(&pool.conn, id)
    }

    /// Returns `false` when the location was already assigned.
    pub fn assign(pool: &mut DbPool, id: &str, location_id: i64, actor: &str) -> AppResult<bool> {
        require(&pool.conn, id)?;
        if locations::get_location(&pool.conn, location_id)?.is_none() {
            return Err(AppError::LocationNotFound(location_id));
        }
        let added = store::assign_location(&pool.conn, id, location_id)?;
        if added {
            ttlog(
                &pool.conn,
                "employee_assign",
                id,
                &audit_message(actor, &format!("Assigned to location #{}", location_id), None),
            )?;
        }
        Ok(added)
    }

    pub fn unassign(pool: &mut DbPool, id: &str, location_id: i64, actor: &str) -> AppResult<bool> {
        require(&pool.conn, id)?;
        let removed = store::unassign_location(&pool.conn, id, location_id)?;
        if removed {
            ttlog(
                &pool.conn,
                "employee_unassign",
                id,
                &audit_message(actor, &format!("Removed from location #{}", location_id), None),
            )?;
        }
        Ok(removed)
    }

    /// Refused while sessions reference the employee.
    pub fn delete(pool: &mut DbPool, id: &str, actor: &str) -> AppResult<()> {
        let emp = require(&pool.conn, id)?;
        if sessions::count_for_employee(&pool.conn, id)? > 0 {
            return Err(AppError::EmployeeHasSessions(id.to_string()));
        }
        store::delete_employee(&pool.conn, id)?;
        ttlog(
            &pool.conn,
            "employee_del",
            id,
            &audit_message(actor, &format!("Deleted {}", emp.name), None),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lifecycle::SessionLogic;

    #[test]
    fn ensure_creates_once_with_email_name() {
        let mut pool = DbPool::in_memory().unwrap();
        let now = Utc::now();

        let (e, created) = EmployeeLogic::ensure(&mut pool, "u-1", Some("marta@bar.es"), now).unwrap();
        assert!(created);
        assert_eq!(e.name, "marta");
        assert_eq!(e.role, Role::Other);

        let (_, created) = EmployeeLogic::ensure(&mut pool, "u-1", None, now).unwrap();
        assert!(!created);
    }

    #[test]
    fn duplicate_id_is_a_validation_error() {
        let mut pool = DbPool::in_memory().unwrap();
        let now = Utc::now();
        EmployeeLogic::add(&mut pool, "ana", Some("Ana"), None, Role::Cook, now).unwrap();
        let err = EmployeeLogic::add(&mut pool, "ana", Some("Ana"), None, Role::Cook, now).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn delete_is_refused_with_sessions() {
        let mut pool = DbPool::in_memory().unwrap();
        let now = Utc::now();
        EmployeeLogic::add(&mut pool, "ana", Some("Ana"), None, Role::Cook, now).unwrap();
        SessionLogic::clock_in(&mut pool, "ana", None, now).unwrap();

        let err = EmployeeLogic::delete(&mut pool, "ana", "boss").unwrap_err();
        assert!(matches!(err, AppError::EmployeeHasSessions(_)));

        EmployeeLogic::add(&mut pool, "bob", None, None, Role::Waiter, now).unwrap();
        EmployeeLogic::delete(&mut pool, "bob", "boss").unwrap();
        assert!(EmployeeLogic::get(&pool.conn, "bob").is_err());
    }

    #[test]
    fn assignments_keep_order_and_require_location() {
        let mut pool = DbPool::in_memory().unwrap();
        let now = Utc::now();
        EmployeeLogic::add(&mut pool, "ana", Some("Ana"), None, Role::Cook, now).unwrap();
        let a = locations::insert_location(&pool.conn, "Centro", None).unwrap();
        let b = locations::insert_location(&pool.conn, "Playa", None).unwrap();

        assert!(EmployeeLogic::assign(&mut pool, "ana", b, "boss").unwrap());
        assert!(EmployeeLogic::assign(&mut pool, "ana", a, "boss").unwrap());
        assert!(!EmployeeLogic::assign(&mut pool, "ana", a, "boss").unwrap());
        assert!(matches!(
            EmployeeLogic::assign(&mut pool, "ana", 99, "boss"),
            Err(AppError::LocationNotFound(99))
        ));

        let e = EmployeeLogic::get(&pool.conn, "ana").unwrap();
        assert_eq!(e.locations, vec![b, a]);
        assert_eq!(e.primary_location(), Some(b));
        assert_eq!(EmployeeLogic::list(&pool.conn, Some(a)).unwrap().len(), 1);
    }
}
