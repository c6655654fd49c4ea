use crate::cli::parser::LocationCmd;
use crate::config::Config;
use crate::core::locations::LocationLogic;
use crate::db::settings::load_settings;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success, warning};
use crate::utils::table::Table;

pub fn handle(cmd: &LocationCmd, cfg: &Config, actor: &str) -> AppResult<()> {
    let mut pool = super::open_pool(cfg)?;

    match cmd {
        LocationCmd::Add { name, no_token } => {
            let loc = LocationLogic::add(&mut pool, name, !*no_token, actor)?;
            success(format!("Location #{} '{}' added.", loc.id, loc.name));
            if let Some(url) = LocationLogic::check_in_url(&cfg.qr_base_url, &loc) {
                info(format!("Check-in URL: {url}"));
            }
        }

        LocationCmd::List => {
            let list = LocationLogic::list(&pool.conn)?;
            if list.is_empty() {
                info("No locations defined.");
                return Ok(());
            }
            let selected = load_settings(&pool.conn)?.selected_location_id;
            let mut t = Table::new(&["ID", "Name", "Token", "Selected"]);
            for l in &list {
                t.add_row(vec![
                    l.id.to_string(),
                    l.name.clone(),
                    l.token().unwrap_or("-").to_string(),
                    if selected == Some(l.id) { "*".into() } else { String::new() },
                ]);
            }
            print!("{}", t.render());
        }

        LocationCmd::Token {
            id,
            set,
            clear,
            regenerate,
        } => {
            let loc = if *regenerate {
                LocationLogic::regenerate_token(&mut pool, *id, actor)?
            } else if *clear {
                LocationLogic::set_token(&mut pool, *id, None, actor)?
            } else if let Some(token) = set {
                LocationLogic::set_token(&mut pool, *id, Some(token), actor)?
            } else {
                return Err(AppError::Validation(
                    "choose one of --set <token>, --clear or --regenerate".into(),
                ));
            };

            match loc.token() {
                Some(t) => {
                    success(format!("Token of '{}' is now {}.", loc.name, t));
                    warning("Previously printed QR codes for this location no longer work.");
                }
                None => success(format!("Token of '{}' cleared.", loc.name)),
            }
        }

        LocationCmd::Url { id } => {
            let loc = LocationLogic::get(&pool.conn, *id)?;
            match LocationLogic::check_in_url(&cfg.qr_base_url, &loc) {
                Some(url) => println!("{url}"),
                None => warning(format!(
                    "Location '{}' has no token; run `turnqr location token {} --regenerate`.",
                    loc.name, loc.id
                )),
            }
        }
    }

    Ok(())
}
