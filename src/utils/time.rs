//! Time utilities: parsing user-entered instants and rendering durations.

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Parse an instant typed on the command line.
///
/// Accepts RFC 3339 (`2024-03-04T09:00:00Z`), a local `YYYY-MM-DD HH:MM`
/// (also with `T`), or a bare `HH:MM` meaning `today` in `tz`.
pub fn parse_instant_in<Tz: TimeZone>(
    s: &str,
    tz: &Tz,
    today: NaiveDate,
) -> AppResult<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveTime::parse_from_str(s, "%H:%M")
                .ok()
                .map(|t| today.and_time(t))
        })
        .ok_or_else(|| AppError::InvalidTimestamp(s.to_string()))?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(|| AppError::InvalidTimestamp(s.to_string()))
}

pub fn parse_instant(s: &str) -> AppResult<DateTime<Utc>> {
    parse_instant_in(s, &Local, Local::now().date_naive())
}

/// `HH:MM` in local time.
pub fn local_hm(t: &DateTime<Utc>) -> String {
    t.with_timezone(&Local).format("%H:%M").to_string()
}

/// `YYYY-MM-DD HH:MM` in local time.
pub fn local_datetime(t: &DateTime<Utc>) -> String {
    t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// e.g. `03h 25m`; negative durations render as zero.
pub fn format_duration(d: Duration) -> String {
    let mins = d.num_minutes().max(0);
    format!("{:02}h {:02}m", mins / 60, mins % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn accepts_the_three_shapes() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let nine_utc = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();

        assert_eq!(parse_instant_in("2024-03-04T09:00:00Z", &tz, today).unwrap(), nine_utc);
        assert_eq!(parse_instant_in("2024-03-04 11:00", &tz, today).unwrap(), nine_utc);
        assert_eq!(parse_instant_in("11:00", &tz, today).unwrap(), nine_utc);
        assert!(matches!(
            parse_instant_in("tomorrow", &tz, today),
            Err(AppError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn durations_are_hours_and_minutes() {
        assert_eq!(format_duration(Duration::minutes(205)), "03h 25m");
        assert_eq!(format_duration(Duration::minutes(-5)), "00h 00m");
    }
}
