use crate::core::token::qr_url;
use crate::db::is_unique_violation;
use crate::db::locations as store;
use crate::db::log::{audit_message, ttlog};
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::models::location::Location;
use rusqlite::Connection;
use uuid::Uuid;

pub struct LocationLogic;

/// Fresh random check-in token.
pub fn new_token() -> String {
    Uuid::new_v4().to_string()
}

impl LocationLogic {
    /// Create a location, optionally with a generated token.
    pub fn add(pool: &mut DbPool, name: &str, with_token: bool, actor: &str) -> AppResult<Location> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("location name cannot be empty".into()));
        }

        let token = with_token.then(new_token);
        let id = match store::insert_location(&pool.conn, name, token.as_deref()) {
            Ok(id) => id,
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::Validation(format!("location '{}' already exists", name)));
            }
            Err(e) => return Err(e.into()),
        };

        ttlog(
            &pool.conn,
            "location_add",
            &format!("#{id}"),
            &audit_message(actor, &format!("Created location '{}'", name), None),
        )?;
        Self::get(&pool.conn, id)
    }

    pub fn get(conn: &Connection, id: i64) -> AppResult<Location> {
        store::get_location(conn, id)?.ok_or(AppError::LocationNotFound(id))
    }

    pub fn list(conn: &Connection) -> AppResult<Vec<Location>> {
        store::list_locations(conn)
    }

    /// Replace (or clear, with `None`) the location's check-in token.
    pub fn set_token(
        pool: &mut DbPool,
        id: i64,
        token: Option<&str>,
        actor: &str,
    ) -> AppResult<Location> {
        Self::get(&pool.conn, id)?;
        let token = token.filter(|t| !t.is_empty());
        store::set_token(&pool.conn, id, token)?;

        let what = if token.is_some() {
            "QR token replaced"
        } else {
            "QR token cleared"
        };
        ttlog(&pool.conn, "location_token", &format!("#{id}"), &audit_message(actor, what, None))?;
        Self::get(&pool.conn, id)
    }

    /// New UUID token; the old QR stops working immediately.
    pub fn regenerate_token(pool: &mut DbPool, id: i64, actor: &str) -> AppResult<Location> {
        let token = new_token();
        Self::set_token(pool, id, Some(&token), actor)
    }

    /// URL to encode in the printed QR, if the location has a token.
    pub fn check_in_url(base: &str, loc: &Location) -> Option<String> {
        loc.token().map(|t| qr_url(base, t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_regenerate() {
        let mut pool = DbPool::in_memory().unwrap();
        let loc = LocationLogic::add(&mut pool, "Centro", true, "boss").unwrap();
        let first = loc.qr_token.clone().unwrap();
        assert_eq!(first.len(), 36);

        let again = LocationLogic::regenerate_token(&mut pool, loc.id, "boss").unwrap();
        assert_ne!(again.qr_token.as_deref(), Some(first.as_str()));

        let url = LocationLogic::check_in_url("https://x.test", &again).unwrap();
        assert!(url.ends_with(again.qr_token.as_deref().unwrap()));
    }

    #[test]
    fn names_are_unique_and_tokens_clearable() {
        let mut pool = DbPool::in_memory().unwrap();
        let loc = LocationLogic::add(&mut pool, "Playa", false, "boss").unwrap();
        assert!(loc.token().is_none());
        assert!(LocationLogic::check_in_url("https://x.test", &loc).is_none());

        let err = LocationLogic::add(&mut pool, "Playa", false, "boss").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let set = LocationLogic::set_token(&mut pool, loc.id, Some("abc"), "boss").unwrap();
        assert_eq!(set.token(), Some("abc"));
        let cleared = LocationLogic::set_token(&mut pool, loc.id, None, "boss").unwrap();
        assert_eq!(cleared.token(), None);
    }
}
