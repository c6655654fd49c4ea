use crate::cli::parser::SessionCmd;
use crate::config::Config;
use crate::core::aggregate::{ReportRange, format_hours};
use crate::core::lifecycle::{ManualSession, SessionEdit, SessionLogic};
use crate::db::sessions::{SessionQuery, list_sessions};
use crate::errors::{AppError, AppResult};
use crate::export::range::parse_range;
use crate::models::session::WorkSession;
use crate::ui::messages::{detail, info, success, warning};
use crate::utils::colors::{colorize_in_out, colorize_optional};
use crate::utils::table::Table;
use crate::utils::time::{local_datetime, local_hm, parse_instant};
use chrono::{DateTime, Local, Utc};

/// Session listing shared by `session list` and `history`.
pub(crate) fn print_sessions(list: &[WorkSession], now: DateTime<Utc>, separator: &str) {
    let mut t = Table::new(&["ID", "Employee", "Date", "In", "Out", "Hours", "Location", "Source"]);
    for s in list {
        let local_in = s.clock_in.with_timezone(&Local);
        let out = s
            .clock_out
            .as_ref()
            .map(local_hm)
            .unwrap_or_else(|| "--:--".to_string());
        let hours = s.elapsed(now).num_milliseconds() as f64 / 3_600_000.0;
        t.add_row(vec![
            s.id.to_string(),
            s.employee_id.clone(),
            local_in.format("%Y-%m-%d").to_string(),
            colorize_in_out(&local_in.format("%H:%M").to_string(), true),
            colorize_in_out(&out, false),
            format_hours(hours, separator),
            colorize_optional(&s.location_id.map(|l| format!("#{l}")).unwrap_or_else(|| "-".into())),
            s.source.to_db_str().to_string(),
        ]);
    }
    print!("{}", t.render());
}

pub fn handle(cmd: &SessionCmd, cfg: &Config, actor: &str) -> AppResult<()> {
    let mut pool = super::open_pool(cfg)?;
    let now = Utc::now();

    match cmd {
        SessionCmd::List {
            employee,
            location,
            range,
        } => {
            let (first, last) = parse_range(range.as_deref(), now.with_timezone(&Local).date_naive())?;
            let r = ReportRange::from_dates(first, last, &Local)?;
            let list = list_sessions(
                &pool.conn,
                &SessionQuery {
                    employee_id: employee.as_deref(),
                    location_id: *location,
                    from: Some(r.start),
                    to: Some(r.end),
                    overlap: false,
                },
            )?;
            if list.is_empty() {
                info(format!("No sessions between {} and {}.", first, last));
            } else {
                print_sessions(&list, now, &cfg.decimal_separator);
            }
        }

        SessionCmd::Add {
            employee,
            clock_in,
            clock_out,
            location,
            reason,
        } => {
            let outcome = SessionLogic::manual_session(
                &mut pool,
                &ManualSession {
                    employee_id: employee,
                    clock_in: parse_instant(clock_in)?,
                    clock_out: parse_instant(clock_out)?,
                    location_id: *location,
                    actor,
                    reason: reason.as_deref(),
                },
                now,
            )?;
            success(format!(
                "Session #{} added for '{}' ({} - {}).",
                outcome.session.id,
                employee,
                local_datetime(&outcome.session.clock_in),
                outcome
                    .session
                    .clock_out
                    .as_ref()
                    .map(local_hm)
                    .unwrap_or_default()
            ));
            if !outcome.overlaps.is_empty() {
                warning("The new session overlaps existing ones:");
                for s in &outcome.overlaps {
                    detail(format!(
                        "#{} {} - {}",
                        s.id,
                        local_datetime(&s.clock_in),
                        s.clock_out.as_ref().map(local_hm).unwrap_or_else(|| "open".into())
                    ));
                }
            }
        }

        SessionCmd::Edit {
            id,
            clock_in,
            clock_out,
            reopen,
            reason,
        } => {
            let edit = SessionEdit {
                clock_in: clock_in.as_deref().map(parse_instant).transpose()?,
                clock_out: if *reopen {
                    Some(None)
                } else {
                    clock_out.as_deref().map(parse_instant).transpose()?.map(Some)
                },
            };
            if edit.is_empty() {
                return Err(AppError::Validation(
                    "nothing to change: pass --in, --out or --reopen".into(),
                ));
            }
            let s = SessionLogic::edit_session(&mut pool, *id, &edit, actor, reason.as_deref())?;
            success(format!("Session #{} updated.", s.id));
            print_sessions(std::slice::from_ref(&s), now, &cfg.decimal_separator);
        }

        SessionCmd::Del { id, reason, yes } => {
            if !*yes && !super::ask_confirmation(&format!("Delete session #{}? This cannot be undone.", id)) {
                warning("Operation cancelled.");
                return Ok(());
            }
            let gone = SessionLogic::delete_session(&mut pool, *id, actor, reason.as_deref())?;
            success(format!("Session #{} of '{}' deleted.", gone.id, gone.employee_id));
        }
    }

    Ok(())
}
