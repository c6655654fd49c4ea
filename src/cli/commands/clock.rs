use crate::cli::parser::{ClockArgs, ClockCmd};
use crate::config::Config;
use crate::core::employees::EmployeeLogic;
use crate::core::lifecycle::{ClockIn, SessionLogic};
use crate::core::locations::LocationLogic;
use crate::core::token::{TokenCache, TokenValidator, extract_token};
use crate::db::employees;
use crate::db::pool::DbPool;
use crate::db::settings::load_settings;
use crate::errors::AppResult;
use crate::models::employee::Employee;
use crate::ui::messages::{detail, info, success, warning};
use crate::utils::time::{format_duration, local_datetime, local_hm};
use chrono::{DateTime, Utc};

/// Token presented on the command line, else the one cached on this terminal.
fn presented_token(args: &ClockArgs, cache: &TokenCache) -> AppResult<Option<String>> {
    let presented = args
        .url
        .as_deref()
        .or(args.token.as_deref())
        .and_then(extract_token);
    cache.resolve(presented)
}

/// Check the QR token and return the employee together with the location
/// the shift belongs to.
///
/// With an explicit `--location` (or when locations carry their own tokens)
/// the token must match a location the employee may use; otherwise the
/// business-wide token is checked and the selected location is used.
fn authorize(
    pool: &mut DbPool,
    cfg: &Config,
    args: &ClockArgs,
    now: DateTime<Utc>,
) -> AppResult<(Employee, Option<i64>)> {
    let id = super::principal(args.employee.as_deref(), cfg)?;
    let cache = TokenCache::new(Config::token_cache_file());
    let token = presented_token(args, &cache)?;

    let assignment = employees::get_employee(&pool.conn, &id)?
        .map(|e| e.locations)
        .unwrap_or_default();
    let location = check_token(pool, args.location, token.as_deref(), &assignment)?;

    let (employee, created) = EmployeeLogic::ensure(pool, &id, args.email.as_deref(), now)?;
    if created {
        info(format!("Created employee record '{}' ({}).", employee.id, employee.name));
    }
    Ok((employee, location))
}

fn check_token(
    pool: &DbPool,
    location: Option<i64>,
    token: Option<&str>,
    assignment: &[i64],
) -> AppResult<Option<i64>> {
    if let Some(loc_id) = location {
        let loc = LocationLogic::get(&pool.conn, loc_id)?;
        TokenValidator::validate_for_location(&loc, token, assignment)?;
        return Ok(Some(loc.id));
    }

    let locations = LocationLogic::list(&pool.conn)?;
    if locations.iter().any(|l| l.token().is_some()) {
        let loc = TokenValidator::resolve_location(&locations, token, assignment)?;
        return Ok(Some(loc.id));
    }

    let settings = load_settings(&pool.conn)?;
    TokenValidator::validate(settings.token(), token)?;
    Ok(settings.selected_location_id)
}

pub fn handle(cmd: &ClockCmd, cfg: &Config) -> AppResult<()> {
    let mut pool = super::open_pool(cfg)?;
    let now = Utc::now();

    match cmd {
        ClockCmd::In { args } => {
            let (employee, location) = authorize(&mut pool, cfg, args, now)?;
            match SessionLogic::clock_in(&mut pool, &employee.id, location, now)? {
                ClockIn::Opened(s) => {
                    success(format!(
                        "{} clocked in at {} (session #{}).",
                        employee.name,
                        local_hm(&s.clock_in),
                        s.id
                    ));
                }
                ClockIn::AlreadyOpen(s) => {
                    info(format!(
                        "{} is already clocked in since {} (session #{}).",
                        employee.name,
                        local_datetime(&s.clock_in),
                        s.id
                    ));
                }
            }
        }

        ClockCmd::Out { args } => {
            let (employee, _) = authorize(&mut pool, cfg, args, now)?;
            match SessionLogic::clock_out(&mut pool, &employee.id, now)? {
                Some(s) => {
                    success(format!(
                        "{} clocked out at {} (session #{}).",
                        employee.name,
                        local_hm(&now),
                        s.id
                    ));
                    detail(format!("Worked {}", format_duration(s.elapsed(now))));
                }
                None => warning(format!("{} has no open session; nothing to close.", employee.name)),
            }
        }

        ClockCmd::Status {
            employee,
            forget_token,
        } => {
            if *forget_token {
                let cache = TokenCache::new(Config::token_cache_file());
                if cache.forget()? {
                    success("Remembered QR token cleared.");
                } else {
                    info("No QR token remembered on this terminal.");
                }
                if employee.is_none() && cfg.employee_id.is_none() {
                    return Ok(());
                }
            }

            let id = super::principal(employee.as_deref(), cfg)?;
            let emp = EmployeeLogic::get(&pool.conn, &id)?;
            match SessionLogic::current_open_session(&pool.conn, &id)? {
                Some(s) => {
                    info(format!(
                        "{} is working since {} (session #{}).",
                        emp.name,
                        local_datetime(&s.clock_in),
                        s.id
                    ));
                    detail(format!("Elapsed {}", format_duration(s.elapsed(now))));
                    let max_hours = load_settings(&pool.conn)?.max_hours;
                    if !SessionLogic::forgotten_clock_outs(std::slice::from_ref(&s), now, max_hours)
                        .is_empty()
                    {
                        warning(format!(
                            "Open for more than {} hours: did you forget to clock out?",
                            max_hours
                        ));
                    }
                }
                None => info(format!("{} is not clocked in.", emp.name)),
            }
        }
    }

    Ok(())
}
