// src/export/logic.rs

use crate::core::aggregate::{ClipMode, ReportRange, aggregate_hours};
use crate::core::employees::EmployeeLogic;
use crate::core::locations::LocationLogic;
use crate::db::pool::DbPool;
use crate::db::sessions::{SessionQuery, list_sessions};
use crate::db::{employees, settings};
use crate::errors::AppResult;
use crate::export::{ExportFormat, warn_on_extension};
use crate::export::fs_utils::{check_output_path, ensure_writable};
use crate::export::json_csv::{export_csv, export_json};
use crate::export::model::{DocumentLabels, ReportDocument};
use crate::export::pdf_export::export_pdf;
use crate::export::range::parse_range;
use crate::export::xlsx::export_xlsx;
use crate::ui::messages::warning;
use chrono::{DateTime, Local, NaiveDate, Utc};
use rusqlite::Connection;
use std::path::PathBuf;

/// Presentation knobs taken from the configuration.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub clip_mode: ClipMode,
    pub decimal_separator: String,
    pub in_progress_label: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            clip_mode: ClipMode::default(),
            decimal_separator: ",".into(),
            in_progress_label: "in progress".into(),
        }
    }
}

/// What to export and where.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub file: PathBuf,
    /// `--range` expression; `None` is the current month.
    pub range: Option<String>,
    /// Location scope; `None` uses the selected location.
    pub location: Option<i64>,
    pub employee: Option<String>,
    pub force: bool,
}

pub struct ExportLogic;

impl ExportLogic {
    /// Aggregate the requested range and write it in the requested format.
    ///
    /// Returns `false` (after a warning) when there is no location to report
    /// on.
    pub fn export(pool: &mut DbPool, opts: &ReportOptions, req: &ExportRequest) -> AppResult<bool> {
        check_output_path(&req.file)?;

        let now = Utc::now();
        let today = now.with_timezone(&Local).date_naive();
        let Some(doc) = Self::build_document(&pool.conn, opts, req, today, now)? else {
            warning("No location selected: choose one with `turnqr settings set --location <id>` or pass --location.");
            return Ok(false);
        };

        warn_on_extension(req.format, &req.file);
        ensure_writable(&req.file, req.force)?;

        let path = req.file.as_path();
        match req.format {
            ExportFormat::Csv => export_csv(&doc, path)?,
            ExportFormat::Json => export_json(&doc, path)?,
            ExportFormat::Xlsx => export_xlsx(&doc, path)?,
            ExportFormat::Pdf => export_pdf(&doc, path)?,
        }
        Ok(true)
    }

    /// Load the roster and sessions in scope and aggregate them.
    ///
    /// `None` when neither the request nor the settings name a location.
    pub fn build_document(
        conn: &Connection,
        opts: &ReportOptions,
        req: &ExportRequest,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> AppResult<Option<ReportDocument>> {
        let (first, last) = parse_range(req.range.as_deref(), today)?;
        let range = ReportRange::from_dates(first, last, &Local)?;

        let cfg = settings::load_settings(conn)?;
        let Some(location_id) = req.location.or(cfg.selected_location_id) else {
            return Ok(None);
        };
        let location = LocationLogic::get(conn, location_id)?;

        let mut roster = employees::list_by_location(conn, location_id)?;
        let mut employee_label = None;
        if let Some(id) = req.employee.as_deref() {
            roster.retain(|e| e.id == id);
            if roster.is_empty() {
                roster.push(EmployeeLogic::get(conn, id)?);
            }
            employee_label = roster.first().map(|e| e.name.clone());
        }

        let sessions = list_sessions(
            conn,
            &SessionQuery {
                employee_id: req.employee.as_deref(),
                location_id: Some(location_id),
                from: Some(range.start),
                to: Some(range.end),
                overlap: opts.clip_mode == ClipMode::Symmetric,
            },
        )?;

        let report = aggregate_hours(&sessions, &roster, &range, now, opts.clip_mode, &Local);
        let labels = DocumentLabels {
            location: Some(location.name.as_str()),
            employee: employee_label.as_deref(),
            clip_mode: opts.clip_mode.as_str(),
            decimal_separator: &opts.decimal_separator,
            in_progress: &opts.in_progress_label,
        };
        Ok(Some(ReportDocument::build(&report, &range, &labels)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lifecycle::{ManualSession, SessionLogic};
    use crate::core::settings::SettingsLogic;
    use crate::models::role::Role;
    use crate::models::settings::SettingsPatch;
    use chrono::{Duration, TimeZone};

    fn request(employee: Option<&str>) -> ExportRequest {
        ExportRequest {
            format: ExportFormat::Json,
            file: PathBuf::from("/tmp/unused.json"),
            range: Some("2024-03".into()),
            location: None,
            employee: employee.map(str::to_string),
            force: true,
        }
    }

    fn local(d: u32, h: u32) -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(2024, 3, d, h, 0, 0)
            .earliest()
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn nothing_to_report_without_a_location() {
        let pool = DbPool::in_memory().unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        let doc = ExportLogic::build_document(
            &pool.conn,
            &ReportOptions::default(),
            &request(None),
            today,
            Utc::now(),
        )
        .unwrap();
        assert!(doc.is_none());
    }

    #[test]
    fn selected_location_scopes_roster_and_sessions() {
        let mut pool = DbPool::in_memory().unwrap();
        let t0 = local(1, 8);

        let centro = LocationLogic::add(&mut pool, "Centro", true, "boss").unwrap();
        let playa = LocationLogic::add(&mut pool, "Playa", true, "boss").unwrap();
        for (id, loc) in [("ana", centro.id), ("bob", centro.id), ("eva", playa.id)] {
            EmployeeLogic::add(&mut pool, id, None, None, Role::Waiter, t0).unwrap();
            EmployeeLogic::assign(&mut pool, id, loc, "boss").unwrap();
        }
        let patch = SettingsPatch {
            selected_location_id: Some(Some(centro.id)),
            ..Default::default()
        };
        SettingsLogic::update(&mut pool, &patch, None, t0, "boss").unwrap();

        for (emp, loc, day) in [("ana", centro.id, 4), ("ana", centro.id, 5), ("eva", playa.id, 4)] {
            let start = local(day, 9);
            SessionLogic::manual_session(
                &mut pool,
                &ManualSession {
                    employee_id: emp,
                    clock_in: start,
                    clock_out: start + Duration::hours(4),
                    location_id: Some(loc),
                    actor: "boss",
                    reason: None,
                },
                t0,
            )
            .unwrap();
        }

        let today = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        let opts = ReportOptions::default();
        let doc = ExportLogic::build_document(&pool.conn, &opts, &request(None), today, Utc::now())
            .unwrap()
            .unwrap();
        assert_eq!(doc.location.as_deref(), Some("Centro"));
        assert_eq!(doc.sessions.len(), 2);
        assert_eq!(doc.subtotals.len(), 2);
        assert_eq!(doc.total_hours, 8.0);
        assert_eq!(doc.average_hours, 4.0);

        let doc = ExportLogic::build_document(&pool.conn, &opts, &request(Some("ana")), today, Utc::now())
            .unwrap()
            .unwrap();
        assert_eq!(doc.employee.as_deref(), Some("ana"));
        assert_eq!(doc.subtotals.len(), 1);
        assert_eq!(doc.average_hours, 8.0);
    }
}
