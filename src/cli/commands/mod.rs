pub mod clock;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod employee;
pub mod export;
pub mod history;
pub mod init;
pub mod location;
pub mod log;
pub mod session;
pub mod settings;

use crate::config::Config;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::warning;
use std::io::{self, Write};

pub(crate) const DEFAULT_ACTOR: &str = "admin";

/// Open the configured database with the schema up to date.
pub(crate) fn open_pool(cfg: &Config) -> AppResult<DbPool> {
    DbPool::open_migrated(&cfg.database, cfg.busy_timeout_ms)
}

/// Employee acting on the employee-facing commands.
pub(crate) fn principal(explicit: Option<&str>, cfg: &Config) -> AppResult<String> {
    explicit
        .or(cfg.employee_id.as_deref())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            AppError::Validation(
                "no employee given: pass --employee or set employee_id in the config".into(),
            )
        })
}

/// Name written to the audit log for administrative changes.
pub(crate) fn actor(explicit: Option<&str>, cfg: &Config) -> String {
    explicit
        .or(cfg.employee_id.as_deref())
        .unwrap_or(DEFAULT_ACTOR)
        .to_string()
}

pub(crate) fn ask_confirmation(prompt: &str) -> bool {
    warning(prompt);
    print!("Confirm [y/N]: ");
    let _ = io::stdout().flush();

    let mut s = String::new();
    if io::stdin().read_line(&mut s).is_ok() {
        matches!(s.trim().to_lowercase().as_str(), "y" | "yes")
    } else {
        false
    }
}
