// src/export/model.rs

use crate::core::aggregate::{EmployeeSubtotal, HourReport, ReportRange, ReportRow, format_hours};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;

/// Flat detail row shared by every export format.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SessionRecord {
    pub employee: String,
    pub role: String,
    pub date: String,
    pub clock_in: String,
    pub clock_out: String,
    pub hours: f64,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SubtotalRecord {
    pub employee: String,
    pub role: String,
    pub sessions: usize,
    pub hours: f64,
}

/// Everything a formatter needs: header lines, totals and both tables.
#[derive(Serialize, Clone, Debug)]
pub struct ReportDocument {
    pub title: String,
    pub location: Option<String>,
    pub employee: Option<String>,
    pub range_start: String,
    pub range_end: String,
    pub clip_mode: String,
    pub total_hours: f64,
    pub average_hours: f64,
    pub subtotals: Vec<SubtotalRecord>,
    pub sessions: Vec<SessionRecord>,

    #[serde(skip)]
    pub decimal_separator: String,
}

/// Labels that are not part of the stored data.
pub struct DocumentLabels<'a> {
    pub location: Option<&'a str>,
    pub employee: Option<&'a str>,
    pub clip_mode: &'a str,
    pub decimal_separator: &'a str,
    pub in_progress: &'a str,
}

/// Hours rounded to two decimals for machine-readable formats.
fn round2(h: f64) -> f64 {
    (h * 100.0).round() / 100.0
}

fn local_date(t: &DateTime<Utc>) -> String {
    t.with_timezone(&Local).format("%Y-%m-%d").to_string()
}

fn session_record(r: &ReportRow, in_progress: &str) -> SessionRecord {
    SessionRecord {
        employee: r.employee_name.clone(),
        role: r.role.clone(),
        date: r.date.format("%Y-%m-%d").to_string(),
        clock_in: r.clock_in.format("%H:%M").to_string(),
        clock_out: r
            .clock_out
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_else(|| in_progress.to_string()),
        hours: round2(r.hours),
    }
}

fn subtotal_record(s: &EmployeeSubtotal) -> SubtotalRecord {
    SubtotalRecord {
        employee: s.employee_name.clone(),
        role: s.role.clone(),
        sessions: s.sessions,
        hours: round2(s.hours),
    }
}

impl ReportDocument {
    pub fn build(report: &HourReport, range: &ReportRange, labels: &DocumentLabels<'_>) -> Self {
        Self {
            title: "Hours report".to_string(),
            location: labels.location.map(str::to_string),
            employee: labels.employee.map(str::to_string),
            range_start: local_date(&range.start),
            range_end: local_date(&range.end),
            clip_mode: labels.clip_mode.to_string(),
            total_hours: round2(report.total_hours),
            average_hours: round2(report.average_hours),
            subtotals: report.subtotals.iter().map(subtotal_record).collect(),
            sessions: report
                .rows
                .iter()
                .map(|r| session_record(r, labels.in_progress))
                .collect(),
            decimal_separator: labels.decimal_separator.to_string(),
        }
    }

    /// Hours as shown to people, e.g. `8,00h`.
    pub fn hours_label(&self, h: f64) -> String {
        format!("{}h", format_hours(h, &self.decimal_separator))
    }

    pub fn range_label(&self) -> String {
        format!("{} - {}", self.range_start, self.range_end)
    }

    /// Header lines printed above the tables.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(loc) = &self.location {
            lines.push(format!("Location: {loc}"));
        }
        lines.push(format!("Range: {}", self.range_label()));
        if let Some(emp) = &self.employee {
            lines.push(format!("Employee: {emp}"));
        }
        lines.push(format!("Total hours: {}", self.hours_label(self.total_hours)));
        lines.push(format!(
            "Average per employee: {}",
            self.hours_label(self.average_hours)
        ));
        lines
    }

    pub fn session_rows(&self) -> Vec<Vec<String>> {
        self.sessions
            .iter()
            .map(|s| {
                vec![
                    s.employee.clone(),
                    s.role.clone(),
                    s.date.clone(),
                    s.clock_in.clone(),
                    s.clock_out.clone(),
                    self.hours_label(s.hours),
                ]
            })
            .collect()
    }

    pub fn subtotal_rows(&self) -> Vec<Vec<String>> {
        self.subtotals
            .iter()
            .map(|s| {
                vec![
                    s.employee.clone(),
                    s.role.clone(),
                    s.sessions.to_string(),
                    self.hours_label(s.hours),
                ]
            })
            .collect()
    }

    /// Detail rows followed by the grand-total row.
    pub fn records_with_total(&self) -> Vec<SessionRecord> {
        let mut out = self.sessions.clone();
        out.push(SessionRecord {
            employee: "TOTAL".to_string(),
            role: String::new(),
            date: String::new(),
            clock_in: String::new(),
            clock_out: String::new(),
            hours: self.total_hours,
        });
        out
    }
}

pub(crate) fn session_headers() -> Vec<&'static str> {
    vec!["Employee", "Role", "Date", "In", "Out", "Hours"]
}

pub(crate) fn subtotal_headers() -> Vec<&'static str> {
    vec!["Employee", "Role", "Sessions", "Total hours"]
}

/// Filler rows so an empty report still renders a readable table.
pub(crate) fn empty_session_row(doc: &ReportDocument) -> Vec<String> {
    vec![
        "No records".into(),
        "-".into(),
        "-".into(),
        "-".into(),
        "-".into(),
        doc.hours_label(0.0),
    ]
}

pub(crate) fn empty_subtotal_row(doc: &ReportDocument) -> Vec<String> {
    vec!["No data".into(), "-".into(), "0".into(), doc.hours_label(0.0)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, TimeZone};

    fn report() -> HourReport {
        HourReport {
            rows: vec![ReportRow {
                session_id: 1,
                employee_id: "ana".into(),
                employee_name: "Ana".into(),
                role: "Cook".into(),
                date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
                clock_in: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                clock_out: None,
                hours: 2.499,
            }],
            subtotals: vec![EmployeeSubtotal {
                employee_id: "ana".into(),
                employee_name: "Ana".into(),
                role: "Cook".into(),
                sessions: 1,
                hours: 2.499,
            }],
            total_hours: 2.499,
            average_hours: 2.499,
        }
    }

    #[test]
    fn open_sessions_use_the_in_progress_label_and_comma_hours() {
        let range = ReportRange::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 30, 12, 0, 0).unwrap(),
        )
        .unwrap();
        let labels = DocumentLabels {
            location: Some("Centro"),
            employee: None,
            clip_mode: "end-only",
            decimal_separator: ",",
            in_progress: "in progress",
        };
        let doc = ReportDocument::build(&report(), &range, &labels);

        assert_eq!(doc.sessions[0].clock_out, "in progress");
        assert_eq!(doc.sessions[0].hours, 2.5);
        assert_eq!(doc.session_rows()[0][5], "2,50h");
        assert!(doc.summary_lines().contains(&"Total hours: 2,50h".to_string()));

        let with_total = doc.records_with_total();
        assert_eq!(with_total.len(), 2);
        assert_eq!(with_total[1].employee, "TOTAL");
    }
}
