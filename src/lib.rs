//! turnqr library root.
//! Exposes the CLI parser, the high-level `run()` function and the modules
//! behind it: the QR token validator, the session lifecycle, hour
//! aggregation and report export.

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod export;
pub mod models;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::commands;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;

/// Central command dispatcher
pub fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let actor = commands::actor(cli.actor.as_deref(), cfg);

    match &cli.command {
        Commands::Init => commands::init::handle(cli),
        Commands::Config { .. } => commands::config::handle(&cli.command, cfg),
        Commands::Db { .. } => commands::db::handle(&cli.command, cfg),
        Commands::Log { .. } => commands::log::handle(&cli.command, cfg),
        Commands::Employee(cmd) => commands::employee::handle(cmd, cfg, &actor),
        Commands::Location(cmd) => commands::location::handle(cmd, cfg, &actor),
        Commands::Settings(cmd) => commands::settings::handle(cmd, cfg, &actor),
        Commands::Clock(cmd) => commands::clock::handle(cmd, cfg),
        Commands::History { .. } => commands::history::handle(&cli.command, cfg),
        Commands::Session(cmd) => commands::session::handle(cmd, cfg, &actor),
        Commands::Dashboard { .. } => commands::dashboard::handle(&cli.command, cfg),
        Commands::Export { .. } => commands::export::handle(&cli.command, cfg),
    }
}

/// Entry point used by main.rs
pub fn run() -> AppResult<()> {
    let cli = Cli::parse();

    let mut cfg = Config::load()?;
    if let Some(custom_db) = &cli.db {
        cfg.database = custom_db.clone();
    }

    dispatch(&cli, &cfg)
}
