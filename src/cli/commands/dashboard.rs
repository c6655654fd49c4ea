use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::dashboard::{ActiveShift, DashboardLogic};
use crate::errors::AppResult;
use crate::ui::messages::{header, info, warning};
use crate::utils::colors::{RESET, color_for_elapsed};
use crate::utils::table::Table;
use crate::utils::time::{format_duration, local_hm};
use chrono::Utc;

fn shift_table(shifts: &[ActiveShift], max_hours: f64) -> Table {
    let mut t = Table::new(&["Session", "Employee", "Role", "Since", "Elapsed"]);
    for s in shifts {
        let hours = s.elapsed.num_minutes() as f64 / 60.0;
        t.add_row(vec![
            format!("#{}", s.session.id),
            s.employee_name.clone(),
            s.role.clone(),
            local_hm(&s.session.clock_in),
            format!(
                "{}{}{}",
                color_for_elapsed(hours, max_hours),
                format_duration(s.elapsed),
                RESET
            ),
        ]);
    }
    t
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Dashboard { location } = cmd {
        let pool = super::open_pool(cfg)?;
        let d = DashboardLogic::build(&pool.conn, *location, Utc::now())?;

        let scope = d
            .location
            .as_ref()
            .map(|l| l.name.clone())
            .unwrap_or_else(|| "all locations".into());
        header(format!("{} · {}", d.business_name, scope));

        println!("Employees : {}", d.roster_size);
        println!("Working   : {}\n", d.active_count());

        if d.active.is_empty() {
            info("Nobody is clocked in right now.");
        } else {
            print!("{}", shift_table(&d.active, d.max_hours).render());
        }

        if !d.forgotten.is_empty() {
            println!();
            warning(format!(
                "{} shift(s) open for more than {} hours (forgotten clock-out?):",
                d.forgotten.len(),
                d.max_hours
            ));
            print!("{}", shift_table(&d.forgotten, d.max_hours).render());
        }
    }

    Ok(())
}
