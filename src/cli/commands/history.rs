use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::employees::EmployeeLogic;
use crate::core::lifecycle::SessionLogic;
use crate::errors::AppResult;
use crate::ui::messages::{header, info};
use chrono::Utc;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::History { employee, limit } = cmd {
        let pool = super::open_pool(cfg)?;
        let id = super::principal(employee.as_deref(), cfg)?;
        let emp = EmployeeLogic::get(&pool.conn, &id)?;

        let mut list = SessionLogic::history(&pool.conn, &id)?;
        if let Some(n) = limit {
            list.truncate(*n);
        }

        header(format!("Shifts of {}", emp.name));
        if list.is_empty() {
            info("No shifts recorded yet.");
        } else {
            super::session::print_sessions(&list, Utc::now(), &cfg.decimal_separator);
        }
    }

    Ok(())
}
