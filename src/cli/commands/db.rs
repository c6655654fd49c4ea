use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::migrate::run_pending_migrations;
use crate::db::pool::DbPool;
use crate::db::stats::{health_problems, print_db_info};
use crate::errors::AppResult;
use crate::ui::messages::{detail, error, info, success, warning};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Db {
        migrate,
        check,
        vacuum,
        info: show_info,
    } = cmd
    else {
        return Ok(());
    };

    if !(*migrate || *check || *vacuum || *show_info) {
        warning("Nothing to do: pass --migrate, --check, --vacuum or --info.");
        return Ok(());
    }

    // migrations run only on request, so open the raw connection
    let mut pool = DbPool::new(&cfg.database, cfg.busy_timeout_ms)?;

    if *migrate {
        info("Applying pending migrations...");
        run_pending_migrations(&pool.conn)?;
        success("Schema is up to date.");
    }

    if *show_info {
        print_db_info(&mut pool, &cfg.database)?;
    }

    if *check {
        info("Checking the time clock database...");
        let problems = health_problems(&pool.conn)?;
        if problems.is_empty() {
            success("No problems found.");
        } else {
            error(format!("{} problem(s) found:", problems.len()));
            for p in &problems {
                detail(p);
            }
        }
    }

    if *vacuum {
        info("Compacting the database file...");
        pool.conn.execute_batch("VACUUM;")?;
        success("VACUUM completed.");
    }

    Ok(())
}
