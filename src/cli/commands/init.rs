use crate::cli::parser::Cli;
use crate::config::Config;
use crate::db::log;
use crate::db::pool::{DEFAULT_BUSY_TIMEOUT_MS, DbPool};
use crate::errors::AppResult;
use crate::ui::messages::warning;

/// Handle the `init` command
///
/// Creates the config directory and file (skipped in test mode), then the
/// SQLite database with every migration applied.
pub fn handle(cli: &Cli) -> AppResult<()> {
    let db_path = Config::init_all(cli.db.clone(), cli.test)?;
    let db_path = db_path.to_string_lossy().to_string();

    println!("⚙️  Initializing turnqr…");
    println!("📄 Config file : {}", Config::config_file().display());
    println!("🗄️  Database   : {}", &db_path);

    let pool = DbPool::open_migrated(&db_path, DEFAULT_BUSY_TIMEOUT_MS)?;

    if let Err(e) = log::ttlog(
        &pool.conn,
        "init",
        "database",
        &format!("Database initialized at {}", &db_path),
    ) {
        warning(format!("Failed to write internal log: {}", e));
    }

    println!("🎉 turnqr initialization completed!");
    Ok(())
}
