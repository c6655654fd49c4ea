//! Hour aggregation over a report range.
//!
//! Pure functions: the caller loads sessions and the roster, passes the
//! current instant and gets back per-session rows, per-employee subtotals
//! and the totals shown in reports.

use crate::errors::{AppError, AppResult};
use crate::models::employee::Employee;
use crate::models::session::WorkSession;
use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const UNNAMED: &str = "Unnamed";
pub const NO_ROLE: &str = "No role";

/// How a session crossing the range boundaries is clipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClipMode {
    /// Only the end is clipped to the range end; a session is counted when
    /// its clock-in falls inside the range.
    #[default]
    EndOnly,
    /// Both ends are clipped; any session overlapping the range is counted.
    Symmetric,
}

impl ClipMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipMode::EndOnly => "end-only",
            ClipMode::Symmetric => "symmetric",
        }
    }
}

/// Inclusive instant range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

fn local_instant<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> AppResult<DateTime<Utc>> {
    let resolved = match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) => Some(t),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        // inside a DST gap: take the first valid instant after it
        LocalResult::None => tz.from_local_datetime(&(naive + Duration::hours(1))).earliest(),
    };
    resolved
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(|| AppError::InvalidDate(naive.to_string()))
}

impl ReportRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<Self> {
        if end < start {
            return Err(AppError::InvalidRange(format!(
                "end {} is before start {}",
                end.to_rfc3339(),
                start.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    /// Local midnight of `start` to 23:59:59.999 of `end` in `tz`.
    pub fn from_dates<Tz: TimeZone>(start: NaiveDate, end: NaiveDate, tz: &Tz) -> AppResult<Self> {
        if end < start {
            return Err(AppError::InvalidRange(format!("{} is before {}", end, start)));
        }
        let first = start
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| AppError::InvalidDate(start.to_string()))?;
        let last = end
            .and_hms_milli_opt(23, 59, 59, 999)
            .ok_or_else(|| AppError::InvalidDate(end.to_string()))?;

        let s = local_instant(tz, first)?;
        let e = local_instant(tz, last)?;
        Self::new(s, e)
    }

    pub fn contains(&self, t: &DateTime<Utc>) -> bool {
        *t >= self.start && *t <= self.end
    }
}

/// Hours a session contributes to the range, evaluated at `now`.
///
/// Open sessions run until `now`. Millisecond precision, never negative.
pub fn session_hours(
    session: &WorkSession,
    range: &ReportRange,
    now: DateTime<Utc>,
    mode: ClipMode,
) -> f64 {
    let end = session.clock_out.unwrap_or(now).min(range.end);
    let start = match mode {
        ClipMode::EndOnly => session.clock_in,
        ClipMode::Symmetric => session.clock_in.max(range.start),
    };
    let ms = (end - start).num_milliseconds().max(0);
    ms as f64 / 3_600_000.0
}

pub fn in_scope(session: &WorkSession, range: &ReportRange, mode: ClipMode) -> bool {
    match mode {
        ClipMode::EndOnly => range.contains(&session.clock_in),
        ClipMode::Symmetric => {
            session.clock_in <= range.end
                && session.clock_out.is_none_or(|out| out >= range.start)
        }
    }
}

/// One counted session, rendered in local time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub session_id: i64,
    pub employee_id: String,
    pub employee_name: String,
    pub role: String,
    pub date: NaiveDate,
    pub clock_in: NaiveTime,
    /// `None` while the session is still open.
    pub clock_out: Option<NaiveTime>,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeSubtotal {
    pub employee_id: String,
    pub employee_name: String,
    pub role: String,
    pub sessions: usize,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourReport {
    pub rows: Vec<ReportRow>,
    pub subtotals: Vec<EmployeeSubtotal>,
    pub total_hours: f64,
    pub average_hours: f64,
}

/// Aggregate `sessions` over `range`.
///
/// Every employee in `roster` gets a subtotal, even with zero hours, in
/// roster order. Sessions of employees missing from the roster are still
/// counted under "Unnamed". The average divides the total by the number of
/// employees in scope.
pub fn aggregate_hours<Tz: TimeZone>(
    sessions: &[WorkSession],
    roster: &[Employee],
    range: &ReportRange,
    now: DateTime<Utc>,
    mode: ClipMode,
    tz: &Tz,
) -> HourReport {
    let by_id: HashMap<&str, &Employee> = roster.iter().map(|e| (e.id.as_str(), e)).collect();

    let mut subtotals: Vec<EmployeeSubtotal> = roster
        .iter()
        .map(|e| EmployeeSubtotal {
            employee_id: e.id.clone(),
            employee_name: display_name(Some(e)),
            role: e.role.label().to_string(),
            sessions: 0,
            hours: 0.0,
        })
        .collect();
    let mut slot: HashMap<String, usize> = subtotals
        .iter()
        .enumerate()
        .map(|(i, s)| (s.employee_id.clone(), i))
        .collect();

    let mut counted: Vec<&WorkSession> = sessions
        .iter()
        .filter(|s| in_scope(s, range, mode))
        .collect();
    counted.sort_by(|a, b| a.clock_in.cmp(&b.clock_in).then(a.id.cmp(&b.id)));

    let mut rows = Vec::with_capacity(counted.len());
    let mut total = 0.0;

    for s in counted {
        let emp = by_id.get(s.employee_id.as_str()).copied();
        let name = display_name(emp);
        let role = emp
            .map(|e| e.role.label().to_string())
            .unwrap_or_else(|| NO_ROLE.to_string());
        let hours = session_hours(s, range, now, mode);
        total += hours;

        let idx = *slot.entry(s.employee_id.clone()).or_insert_with(|| {
            subtotals.push(EmployeeSubtotal {
                employee_id: s.employee_id.clone(),
                employee_name: name.clone(),
                role: role.clone(),
                sessions: 0,
                hours: 0.0,
            });
            subtotals.len() - 1
        });
        subtotals[idx].sessions += 1;
        subtotals[idx].hours += hours;

        let local_in = s.clock_in.with_timezone(tz);
        rows.push(ReportRow {
            session_id: s.id,
            employee_id: s.employee_id.clone(),
            employee_name: name,
            role,
            date: local_in.date_naive(),
            clock_in: local_in.time(),
            clock_out: s.clock_out.map(|o| o.with_timezone(tz).time()),
            hours,
        });
    }

    // employees outside the roster get a subtotal row but do not count
    let average = if roster.is_empty() {
        0.0
    } else {
        total / roster.len() as f64
    };

    HourReport {
        rows,
        subtotals,
        total_hours: total,
        average_hours: average,
    }
}

fn display_name(emp: Option<&Employee>) -> String {
    emp.map(|e| e.name.trim())
        .filter(|n| !n.is_empty())
        .unwrap_or(UNNAMED)
        .to_string()
}

/// Two decimals with the configured separator, e.g. `8,00`.
pub fn format_hours(hours: f64, separator: &str) -> String {
    let s = format!("{:.2}", hours);
    if separator == "." {
        s
    } else {
        s.replace('.', separator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::role::Role;
    use crate::models::session::{SessionSource, SessionStatus};

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn session(id: i64, emp: &str, start: &str, end: Option<&str>) -> WorkSession {
        let clock_out = end.map(ts);
        WorkSession {
            id,
            employee_id: emp.into(),
            clock_in: ts(start),
            clock_out,
            status: SessionStatus::for_clock_out(clock_out.as_ref()),
            location_id: Some(1),
            source: SessionSource::Clock,
            created_at: ts(start),
        }
    }

    fn employee(id: &str, name: &str) -> Employee {
        Employee {
            id: id.into(),
            name: name.into(),
            email: None,
            role: Role::Waiter,
            is_active: true,
            locations: vec![1],
        }
    }

    fn january() -> ReportRange {
        ReportRange::from_dates(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            &Utc,
        )
        .unwrap()
    }

    #[test]
    fn full_day_inside_range() {
        let s = session(1, "a", "2024-01-10T09:00:00Z", Some("2024-01-10T17:00:00Z"));
        let h = session_hours(&s, &january(), ts("2024-02-01T00:00:00Z"), ClipMode::EndOnly);
        assert_eq!(h, 8.0);
    }

    #[test]
    fn open_session_counts_until_now() {
        let s = session(1, "a", "2024-01-10T09:00:00Z", None);
        let h = session_hours(&s, &january(), ts("2024-01-10T12:00:00Z"), ClipMode::EndOnly);
        assert_eq!(h, 3.0);
    }

    #[test]
    fn end_is_clipped_at_millisecond_precision() {
        let range = january();
        assert_eq!(range.end, ts("2024-01-31T23:59:59.999Z"));

        let s = session(1, "a", "2024-01-31T22:00:00Z", Some("2024-02-01T02:00:00Z"));
        let h = session_hours(&s, &range, ts("2024-02-02T00:00:00Z"), ClipMode::EndOnly);
        assert!((h - 7_199_999.0 / 3_600_000.0).abs() < 1e-12);
        assert!(h > 1.9999997 && h < 2.0);
    }

    #[test]
    fn start_is_not_clipped_in_end_only_mode() {
        let range = january();
        let s = session(1, "a", "2023-12-31T22:00:00Z", Some("2024-01-01T02:00:00Z"));
        assert!(!in_scope(&s, &range, ClipMode::EndOnly));
        assert!(in_scope(&s, &range, ClipMode::Symmetric));

        let h = session_hours(&s, &range, ts("2024-02-01T00:00:00Z"), ClipMode::Symmetric);
        assert_eq!(h, 2.0);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = ReportRange::from_dates(
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            &Utc,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidRange(_)));
    }

    #[test]
    fn local_midnight_respects_offset() {
        let tz = chrono::FixedOffset::east_opt(3600).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let r = ReportRange::from_dates(day, day, &tz).unwrap();
        assert_eq!(r.start, ts("2024-01-09T23:00:00Z"));
        assert_eq!(r.end, ts("2024-01-10T22:59:59.999Z"));
    }

    #[test]
    fn average_divides_by_employees_in_scope() {
        let roster = vec![employee("a", "Ana"), employee("b", "Bea"), employee("c", "Carla")];
        let sessions = vec![
            session(1, "a", "2024-01-10T08:00:00Z", Some("2024-01-10T14:00:00Z")),
            session(2, "b", "2024-01-11T10:00:00Z", Some("2024-01-11T14:00:00Z")),
        ];
        let report = aggregate_hours(
            &sessions,
            &roster,
            &january(),
            ts("2024-02-01T00:00:00Z"),
            ClipMode::EndOnly,
            &Utc,
        );

        assert_eq!(report.total_hours, 10.0);
        assert_eq!(report.subtotals.len(), 3);
        assert_eq!(report.subtotals[2].hours, 0.0);
        assert!((report.average_hours - 10.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn rows_are_ordered_and_fall_back_for_unknown_employees() {
        let roster = vec![employee("a", "Ana")];
        let sessions = vec![
            session(2, "a", "2024-01-12T08:00:00Z", None),
            session(1, "zz", "2024-01-10T08:00:00Z", Some("2024-01-10T09:30:00Z")),
        ];
        let report = aggregate_hours(
            &sessions,
            &roster,
            &january(),
            ts("2024-01-12T10:00:00Z"),
            ClipMode::EndOnly,
            &Utc,
        );

        assert_eq!(report.rows[0].employee_name, UNNAMED);
        assert_eq!(report.rows[0].role, NO_ROLE);
        assert_eq!(report.rows[1].clock_out, None);
        assert_eq!(report.subtotals.len(), 2);
        assert_eq!(report.total_hours, 3.5);
        assert_eq!(report.average_hours, 3.5);
    }

    #[test]
    fn average_divides_by_roster_not_by_session_owners() {
        let roster = vec![employee("a", "Ana")];
        let sessions = vec![
            session(1, "a", "2024-01-10T08:00:00Z", Some("2024-01-10T10:00:00Z")),
            session(2, "zz", "2024-01-11T08:00:00Z", Some("2024-01-11T10:00:00Z")),
        ];
        let report = aggregate_hours(
            &sessions,
            &roster,
            &january(),
            ts("2024-01-31T00:00:00Z"),
            ClipMode::EndOnly,
            &Utc,
        );

        assert_eq!(report.subtotals.len(), 2);
        assert_eq!(report.total_hours, 4.0);
        assert_eq!(report.average_hours, 4.0);
    }

    #[test]
    fn empty_scope_has_zero_average() {
        let report = aggregate_hours(&[], &[], &january(), Utc::now(), ClipMode::EndOnly, &Utc);
        assert_eq!(report.average_hours, 0.0);
        assert!(report.rows.is_empty());
    }

    #[test]
    fn hours_use_the_configured_separator() {
        assert_eq!(format_hours(8.0, ","), "8,00");
        assert_eq!(format_hours(1.999_999_72, ","), "2,00");
        assert_eq!(format_hours(3.333, "."), "3.33");
    }
}
