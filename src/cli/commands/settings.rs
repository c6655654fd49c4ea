use crate::cli::parser::{SettingsArgs, SettingsCmd};
use crate::config::Config;
use crate::core::settings::{SettingsLogic, parse_expected};
use crate::errors::{AppError, AppResult};
use crate::models::session::to_db_timestamp;
use crate::models::settings::{AppSettings, SettingsPatch};
use crate::ui::messages::{info, success};
use chrono::{DateTime, NaiveTime, Utc};

fn stamp_label(s: &AppSettings) -> String {
    s.updated_at
        .as_ref()
        .map(to_db_timestamp)
        .unwrap_or_else(|| "never".to_string())
}

fn print_settings(s: &AppSettings) {
    println!("Business name : {}", s.business_name);
    println!("Opening time  : {}", s.opening_time.format("%H:%M"));
    println!("Max hours     : {}", s.max_hours);
    println!("QR token      : {}", s.token().unwrap_or("-"));
    println!(
        "Location      : {}",
        s.selected_location_id
            .map(|id| format!("#{id}"))
            .unwrap_or_else(|| "-".into())
    );
    println!("Version       : {}", stamp_label(s));
}

fn to_patch(v: &SettingsArgs) -> AppResult<SettingsPatch> {
    let opening_time = match v.opening.as_deref() {
        Some(raw) => Some(
            NaiveTime::parse_from_str(raw, "%H:%M")
                .map_err(|_| AppError::InvalidTime(raw.to_string()))?,
        ),
        None => None,
    };

    let selected_location_id = if v.no_location {
        Some(None)
    } else {
        v.location.map(Some)
    };
    let qr_token = if v.clear_token {
        Some(None)
    } else {
        v.token.clone().map(Some)
    };

    Ok(SettingsPatch {
        business_name: v.name.clone(),
        opening_time,
        max_hours: v.max_hours,
        qr_token,
        selected_location_id,
    })
}

fn expected(raw: &Option<String>) -> AppResult<Option<Option<DateTime<Utc>>>> {
    raw.as_deref().map(parse_expected).transpose()
}

pub fn handle(cmd: &SettingsCmd, cfg: &Config, actor: &str) -> AppResult<()> {
    let mut pool = super::open_pool(cfg)?;

    match cmd {
        SettingsCmd::Show => {
            let s = SettingsLogic::show(&pool.conn)?;
            print_settings(&s);
        }

        SettingsCmd::Set { values, expect } => {
            let patch = to_patch(values)?;
            let saved =
                SettingsLogic::update(&mut pool, &patch, expected(expect)?, Utc::now(), actor)?;
            success("Settings saved.");
            info(format!("New version: {}", stamp_label(&saved)));
        }

        SettingsCmd::RegenerateToken { expect } => {
            let saved =
                SettingsLogic::regenerate_token(&mut pool, expected(expect)?, Utc::now(), actor)?;
            success(format!(
                "New business QR token: {}",
                saved.token().unwrap_or("-")
            ));
            info(format!("New version: {}", stamp_label(&saved)));
        }
    }

    Ok(())
}
