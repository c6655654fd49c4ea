use crate::errors::{AppError, AppResult};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Open,
    Closed,
}

impl SessionStatus {
    /// Status is never stored independently of the clock-out.
    pub fn for_clock_out(clock_out: Option<&DateTime<Utc>>) -> Self {
        match clock_out {
            Some(_) => SessionStatus::Closed,
            None => SessionStatus::Open,
        }
    }

    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            SessionStatus::Open => "open",
            SessionStatus::Closed => "closed",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(SessionStatus::Open),
            "closed" => Some(SessionStatus::Closed),
            _ => None,
        }
    }
}

/// Who produced the row: the employee at the clock, or an administrator.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionSource {
    Clock,
    Manual,
}

impl SessionSource {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            SessionSource::Clock => "clock",
            SessionSource::Manual => "manual",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "clock" => Some(SessionSource::Clock),
            "manual" => Some(SessionSource::Manual),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WorkSession {
    pub id: i64,
    pub employee_id: String,
    pub clock_in: DateTime<Utc>,
    pub clock_out: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub location_id: Option<i64>,
    pub source: SessionSource,
    pub created_at: DateTime<Utc>,
}

impl WorkSession {
    pub fn is_open(&self) -> bool {
        self.clock_out.is_none()
    }

    /// Whether `[clock_in, clock_out ?? now]` intersects the other session's interval.
    pub fn overlaps(&self, other: &WorkSession, now: DateTime<Utc>) -> bool {
        let a_end = self.clock_out.unwrap_or(now);
        let b_end = other.clock_out.unwrap_or(now);
        self.clock_in < b_end && other.clock_in < a_end
    }

    /// Elapsed time of the session, open sessions measured up to `now`.
    pub fn elapsed(&self, now: DateTime<Utc>) -> chrono::Duration {
        let end = self.clock_out.unwrap_or(now);
        (end - self.clock_in).max(chrono::Duration::zero())
    }
}

/// Canonical storage form: RFC 3339, UTC, millisecond precision.
/// A single fixed-width format keeps lexical and chronological order equal.
pub fn to_db_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn from_db_timestamp(s: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::InvalidTimestamp(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session(id: i64, start_h: u32, end_h: Option<u32>) -> WorkSession {
        let day = |h| Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap();
        WorkSession {
            id,
            employee_id: "ana".into(),
            clock_in: day(start_h),
            clock_out: end_h.map(day),
            status: SessionStatus::for_clock_out(end_h.map(day).as_ref()),
            location_id: None,
            source: SessionSource::Clock,
            created_at: day(start_h),
        }
    }

    #[test]
    fn status_follows_clock_out() {
        assert_eq!(SessionStatus::for_clock_out(None), SessionStatus::Open);
        let now = Utc::now();
        assert_eq!(
            SessionStatus::for_clock_out(Some(&now)),
            SessionStatus::Closed
        );
    }

    #[test]
    fn timestamps_keep_millis_and_sort_lexically() {
        let a = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap()
            + chrono::Duration::milliseconds(999);
        let b = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let sa = to_db_timestamp(&a);
        assert_eq!(sa, "2024-01-31T23:59:59.999Z");
        assert!(sa < to_db_timestamp(&b));
        assert_eq!(from_db_timestamp(&sa).unwrap(), a);
    }

    #[test]
    fn rejects_garbage_timestamp() {
        assert!(matches!(
            from_db_timestamp("yesterday"),
            Err(AppError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn overlap_uses_now_for_open_sessions() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let closed = session(1, 9, Some(11));
        let open = session(2, 10, None);
        let later = session(3, 11, Some(12));
        assert!(closed.overlaps(&open, now));
        assert!(!closed.overlaps(&later, now));
        assert_eq!(open.elapsed(now), chrono::Duration::hours(2));
    }
}
