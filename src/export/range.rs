// src/export/range.rs

use crate::errors::{AppError, AppResult};
use chrono::{Datelike, Months, NaiveDate};

fn bad(msg: impl Into<String>) -> AppError {
    AppError::InvalidRange(msg.into())
}

fn year(s: &str) -> AppResult<i32> {
    s.parse().map_err(|_| bad(format!("invalid year '{s}'")))
}

/// `YYYY-MM` to (year, month).
fn year_month(s: &str) -> AppResult<(i32, u32)> {
    let (y, m) = s
        .split_once('-')
        .ok_or_else(|| bad(format!("invalid month '{s}'")))?;
    let m: u32 = m.parse().map_err(|_| bad(format!("invalid month '{s}'")))?;
    Ok((year(y)?, m))
}

fn day(s: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| bad(format!("invalid date '{s}'")))
}

fn month_first(y: i32, m: u32) -> AppResult<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, 1).ok_or_else(|| bad(format!("invalid month {y}-{m:02}")))
}

fn month_last(y: i32, m: u32) -> AppResult<NaiveDate> {
    let last = month_last_day(y, m).ok_or_else(|| bad(format!("invalid month {y}-{m:02}")))?;
    NaiveDate::from_ymd_opt(y, m, last).ok_or_else(|| bad(format!("invalid month {y}-{m:02}")))
}

fn year_bounds(y: i32) -> AppResult<(NaiveDate, NaiveDate)> {
    Ok((month_first(y, 1)?, month_last(y, 12)?))
}

/// Calendar month containing `today`, shifted back by `back` months.
pub(crate) fn month_of(today: NaiveDate, back: u32) -> AppResult<(NaiveDate, NaiveDate)> {
    let d = today
        .checked_sub_months(Months::new(back))
        .ok_or_else(|| bad("month out of range"))?;
    Ok((month_first(d.year(), d.month())?, month_last(d.year(), d.month())?))
}

/// Parse `--range` into inclusive local dates.
///
/// Accepted forms:
/// - `this-month`, `last-month`
/// - `YYYY`, `YYYY-MM`, `YYYY-MM-DD`
/// - `YYYY:YYYY`, `YYYY-MM:YYYY-MM`, `YYYY-MM-DD:YYYY-MM-DD`
///
/// `None` means the current month.
pub(crate) fn parse_range(r: Option<&str>, today: NaiveDate) -> AppResult<(NaiveDate, NaiveDate)> {
    let r = match r.map(str::trim) {
        None | Some("") | Some("this-month") => return month_of(today, 0),
        Some("last-month") => return month_of(today, 1),
        Some(r) => r,
    };

    let (start, end) = if let Some((start_raw, end_raw)) = r.split_once(':') {
        let (start, end) = (start_raw.trim(), end_raw.trim());
        if start.len() != end.len() {
            return Err(bad("start and end must have the same format"));
        }
        match start.len() {
            4 => (year_bounds(year(start)?)?.0, year_bounds(year(end)?)?.1),
            7 => {
                let (ys, ms) = year_month(start)?;
                let (ye, me) = year_month(end)?;
                (month_first(ys, ms)?, month_last(ye, me)?)
            }
            10 => (day(start)?, day(end)?),
            _ => return Err(bad(format!("unsupported range format '{r}'"))),
        }
    } else {
        match r.len() {
            4 => year_bounds(year(r)?)?,
            7 => {
                let (y, m) = year_month(r)?;
                (month_first(y, m)?, month_last(y, m)?)
            }
            10 => {
                let d = day(r)?;
                (d, d)
            }
            _ => return Err(bad(format!("unsupported range format '{r}'"))),
        }
    };

    if end < start {
        return Err(bad(format!("{end} is before {start}")));
    }
    Ok((start, end))
}

fn month_last_day(y: i32, m: u32) -> Option<u32> {
    match m {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => Some(31),
        4 | 6 | 9 | 11 => Some(30),
        2 => {
            let leap = (y % 4 == 0 && y % 100 != 0) || (y % 400 == 0);
            Some(if leap { 29 } else { 28 })
        }
        _ => None,
    }
}
