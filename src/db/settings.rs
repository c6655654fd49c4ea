//! `app_settings` singleton with compare-and-swap writes.

use crate::db::{from_row_error, is_primary_key_violation, is_unique_violation, malformed};
use crate::errors::{AppError, AppResult};
use crate::models::session::{from_db_timestamp, to_db_timestamp};
use crate::models::settings::AppSettings;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

fn map_row(row: &Row) -> rusqlite::Result<AppSettings> {
    let opening_raw: String = row.get("opening_time")?;
    let opening_time = NaiveTime::parse_from_str(&opening_raw, "%H:%M")
        .map_err(|_| malformed("opening_time", &opening_raw))?;
    let updated_raw: String = row.get("updated_at")?;
    let updated_at =
        from_db_timestamp(&updated_raw).map_err(|_| malformed("updated_at", &updated_raw))?;

    Ok(AppSettings {
        business_name: row.get("business_name")?,
        opening_time,
        max_hours: row.get("max_hours")?,
        qr_token: row.get("qr_token")?,
        selected_location_id: row.get("selected_location_id")?,
        updated_at: Some(updated_at),
    })
}

/// Current settings, or defaults when the row has never been written.
pub fn load_settings(conn: &Connection) -> AppResult<AppSettings> {
    let mut stmt = conn.prepare_cached(
        "SELECT business_name, opening_time, max_hours, qr_token, selected_location_id, updated_at
         FROM app_settings WHERE id = 1",
    )?;
    let row = stmt
        .query_row([], map_row)
        .optional()
        .map_err(from_row_error)?;
    Ok(row.unwrap_or_default())
}

fn stamp_label(ts: Option<&DateTime<Utc>>) -> String {
    ts.map(to_db_timestamp).unwrap_or_else(|| "<never saved>".to_string())
}

/// Write `next` only if the stored stamp still equals `expected`.
///
/// `expected = None` means "the row has never been saved". Returns the stored
/// settings with their new stamp.
pub fn save_settings(
    conn: &Connection,
    next: &AppSettings,
    expected: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> AppResult<AppSettings> {
    // The stamp must move forward even for two writes in the same millisecond.
    let stamp = match expected {
        Some(prev) if now <= prev => prev + Duration::milliseconds(1),
        _ => now,
    };
    let stamp_s = to_db_timestamp(&stamp);
    let opening = next.opening_time.format("%H:%M").to_string();

    let changed = match expected {
        None => {
            let res = conn.execute(
                "INSERT INTO app_settings
                    (id, business_name, opening_time, max_hours, qr_token, selected_location_id, updated_at)
                 VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    next.business_name,
                    opening,
                    next.max_hours,
                    next.qr_token,
                    next.selected_location_id,
                    stamp_s
                ],
            );
            match res {
                Ok(n) => n,
                Err(e) if is_unique_violation(&e) || is_primary_key_violation(&e) => 0,
                Err(e) => return Err(e.into()),
            }
        }
        Some(prev) => conn.execute(
            "UPDATE app_settings
             SET business_name = ?1, opening_time = ?2, max_hours = ?3, qr_token = ?4,
                 selected_location_id = ?5, updated_at = ?6
             WHERE id = 1 AND updated_at = ?7",
            params![
                next.business_name,
                opening,
                next.max_hours,
                next.qr_token,
                next.selected_location_id,
                stamp_s,
                to_db_timestamp(&prev)
            ],
        )?,
    };

    if changed == 0 {
        let current = load_settings(conn)?;
        return Err(AppError::SettingsConflict {
            expected: stamp_label(expected.as_ref()),
            found: stamp_label(current.updated_at.as_ref()),
        });
    }

    let mut saved = next.clone();
    saved.updated_at = Some(stamp);
    Ok(saved)
}
