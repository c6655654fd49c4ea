// src/export/excel_date.rs

use chrono::{NaiveDate, NaiveTime, Timelike};

/// Interpret a report cell as an Excel date or time.
///
/// Returns the number format and the Excel serial value. Anything else
/// (including the "in progress" label) stays text.
pub(crate) fn parse_to_excel_date(s: &str) -> Option<(&'static str, f64)> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date_serial(d).map(|serial| ("yyyy-mm-dd", serial));
    }

    for fmt in ["%H:%M:%S", "%H:%M"] {
        if let Ok(t) = NaiveTime::parse_from_str(s, fmt) {
            return Some(("hh:mm", time_fraction(t)));
        }
    }

    None
}

/// Days since the Excel epoch (1899-12-30).
fn date_serial(d: NaiveDate) -> Option<f64> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    Some((d - epoch).num_days() as f64)
}

fn time_fraction(t: NaiveTime) -> f64 {
    t.num_seconds_from_midnight() as f64 / 86400.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_and_times_become_serials() {
        assert_eq!(parse_to_excel_date("1900-01-01"), Some(("yyyy-mm-dd", 2.0)));
        assert_eq!(parse_to_excel_date("12:00"), Some(("hh:mm", 0.5)));
        assert_eq!(parse_to_excel_date("in progress"), None);
    }
}
