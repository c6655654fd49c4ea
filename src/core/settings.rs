use crate::core::locations::new_token;
use crate::db::locations;
use crate::db::log::{audit_message, ttlog};
use crate::db::pool::DbPool;
use crate::db::settings as store;
use crate::errors::{AppError, AppResult};
use crate::models::session::from_db_timestamp;
use crate::models::settings::{AppSettings, SettingsPatch};
use chrono::{DateTime, Utc};
use rusqlite::Connection;

pub struct SettingsLogic;

/// Parse the `--expect` value: an RFC 3339 stamp, or `never` for a row that
/// has not been saved yet.
pub fn parse_expected(raw: &str) -> AppResult<Option<DateTime<Utc>>> {
    match raw.trim() {
        "never" | "" => Ok(None),
        s => from_db_timestamp(s).map(Some),
    }
}

impl SettingsLogic {
    pub fn show(conn: &Connection) -> AppResult<AppSettings> {
        store::load_settings(conn)
    }

    /// Apply `patch` if nobody saved in between.
    ///
    /// `expected = None` reads the current stamp first (plain
    /// read-modify-write); `Some(stamp)` fails with `SettingsConflict` when
    /// the stored stamp differs.
    pub fn update(
        pool: &mut DbPool,
        patch: &SettingsPatch,
        expected: Option<Option<DateTime<Utc>>>,
        now: DateTime<Utc>,
        actor: &str,
    ) -> AppResult<AppSettings> {
        if patch.is_empty() {
            return Err(AppError::Validation("nothing to update".into()));
        }
        if let Some(h) = patch.max_hours
            && !(h > 0.0 && h <= 24.0)
        {
            return Err(AppError::Validation(format!(
                "max hours must be between 0 and 24, got {h}"
            )));
        }
        if let Some(Some(loc)) = patch.selected_location_id
            && locations::get_location(&pool.conn, loc)?.is_none()
        {
            return Err(AppError::LocationNotFound(loc));
        }

        let current = store::load_settings(&pool.conn)?;
        let expected = expected.unwrap_or(current.updated_at);

        let mut next = current.clone();
        patch.apply(&mut next);

        let saved = store::save_settings(&pool.conn, &next, expected, now)?;
        ttlog(
            &pool.conn,
            "settings_update",
            "app_settings",
            &audit_message(actor, &describe(&current, &saved), None),
        )?;
        Ok(saved)
    }

    /// Replace the business-wide token with a fresh UUID.
    pub fn regenerate_token(
        pool: &mut DbPool,
        expected: Option<Option<DateTime<Utc>>>,
        now: DateTime<Utc>,
        actor: &str,
    ) -> AppResult<AppSettings> {
        let patch = SettingsPatch {
            qr_token: Some(Some(new_token())),
            ..Default::default()
        };
        Self::update(pool, &patch, expected, now, actor)
    }
}

fn describe(before: &AppSettings, after: &AppSettings) -> String {
    let mut changed = Vec::new();
    if before.business_name != after.business_name {
        changed.push(format!("business_name='{}'", after.business_name));
    }
    if before.opening_time != after.opening_time {
        changed.push(format!("opening_time={}", after.opening_time.format("%H:%M")));
    }
    if before.max_hours != after.max_hours {
        changed.push(format!("max_hours={}", after.max_hours));
    }
    if before.qr_token != after.qr_token {
        changed.push("qr_token".to_string());
    }
    if before.selected_location_id != after.selected_location_id {
        let v = after
            .selected_location_id
            .map(|id| format!("#{id}"))
            .unwrap_or_else(|| "none".into());
        changed.push(format!("selected_location={v}"));
    }
    if changed.is_empty() {
        "Settings saved (no changes)".to_string()
    } else {
        format!("Settings updated: {}", changed.join(", "))
    }
}
