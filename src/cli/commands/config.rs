use crate::cli::parser::Commands;
use crate::config::Config;
use crate::config::migrate::{run_config_migration, upgrade_config_file};
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{error, info, success, warning};
use serde_yaml::Value;
use std::fs;
use std::process::Command;

/// Keys present in the defaults but missing from the file on disk.
fn missing_keys() -> AppResult<Vec<String>> {
    let path = Config::config_file();
    if !path.exists() {
        return Ok(Vec::new());
    }
    let on_disk: Value = serde_yaml::from_str(&fs::read_to_string(&path)?)
        .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?;
    let defaults =
        serde_yaml::to_value(Config::default()).map_err(|e| AppError::Config(e.to_string()))?;

    let mut missing = Vec::new();
    if let (Some(file), Some(all)) = (on_disk.as_mapping(), defaults.as_mapping()) {
        for key in all.keys() {
            if !file.contains_key(key)
                && let Some(k) = key.as_str()
            {
                missing.push(k.to_string());
            }
        }
    }
    Ok(missing)
}

fn edit(editor: &Option<String>) {
    let path = Config::config_file();
    let default_editor = std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| "nano".to_string());
    let editor_to_use = editor.clone().unwrap_or_else(|| default_editor.clone());

    match Command::new(&editor_to_use).arg(&path).status() {
        Ok(s) if s.success() => {
            success(format!("Configuration file edited using '{}'", editor_to_use));
        }
        _ => {
            warning(format!(
                "Editor '{}' not available, falling back to '{}'",
                editor_to_use, default_editor
            ));
            match Command::new(&default_editor).arg(&path).status() {
                Ok(s) if s.success() => success(format!(
                    "Configuration file edited using fallback '{}'",
                    default_editor
                )),
                _ => error(format!(
                    "Failed to edit configuration file using '{}'",
                    default_editor
                )),
            }
        }
    }
}

/// Handle the `config` subcommand
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Config {
        print_config,
        check,
        migrate,
        edit_config,
        editor,
    } = cmd
    {
        if *print_config {
            println!("📄 Current configuration ({}):\n", Config::config_file().display());
            let yaml = serde_yaml::to_string(cfg).map_err(|e| AppError::Config(e.to_string()))?;
            println!("{yaml}");
        }

        if *check {
            let missing = missing_keys()?;
            if missing.is_empty() {
                success("Configuration file is complete.");
            } else {
                warning(format!(
                    "Missing fields (defaults in use): {}. Run `turnqr config --migrate`.",
                    missing.join(", ")
                ));
            }
        }

        if *migrate {
            run_config_migration()?;
        }

        if *edit_config {
            edit(editor);
            let added = upgrade_config_file(&Config::config_file())?;
            if !added.is_empty() {
                info(format!("Restored missing fields: {}", added.join(", ")));
            }
        }
    }

    Ok(())
}
