//! Bring an existing configuration file up to date with the current keys.

use super::Config;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success};
use serde_yaml::Value;
use std::fs;
use std::path::Path;

/// Add every key missing from the YAML file with its default value.
/// Existing values (and unknown keys) are left untouched.
///
/// Returns the names of the keys that were added.
pub fn upgrade_config_file(path: &Path) -> AppResult<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)?;
    let mut yaml: Value = if content.trim().is_empty() {
        Value::Mapping(Default::default())
    } else {
        serde_yaml::from_str(&content)
            .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?
    };

    let defaults = serde_yaml::to_value(Config::default())
        .map_err(|e| AppError::Config(e.to_string()))?;

    let (Some(map), Some(default_map)) = (yaml.as_mapping_mut(), defaults.as_mapping()) else {
        return Err(AppError::Config(format!(
            "{} is not a key/value document",
            path.display()
        )));
    };

    let mut added = Vec::new();
    for (key, value) in default_map {
        if !map.contains_key(key) {
            map.insert(key.clone(), value.clone());
            if let Some(k) = key.as_str() {
                added.push(k.to_string());
            }
        }
    }

    if !added.is_empty() {
        let serialized =
            serde_yaml::to_string(&yaml).map_err(|e| AppError::Config(e.to_string()))?;
        fs::write(path, serialized)?;
    }
    Ok(added)
}

/// Run the upgrade on the default config file and report what changed.
pub fn run_config_migration() -> AppResult<()> {
    let path = Config::config_file();
    let added = upgrade_config_file(&path)?;
    if added.is_empty() {
        info("Configuration is up to date.");
    } else {
        success(format!(
            "Configuration upgraded: added {}",
            added.join(", ")
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_missing_keys_and_keeps_existing_ones() {
        let dir = std::env::temp_dir().join(format!("turnqr_cfgmig_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join("turnqr.conf");
        fs::write(&file, "database: /srv/turnqr.sqlite\ndecimal_separator: '.'\n").unwrap();

        let added = upgrade_config_file(&file).unwrap();
        assert!(added.contains(&"clip_mode".to_string()));
        assert!(!added.contains(&"database".to_string()));

        let cfg = Config::load_from(&file).unwrap();
        assert_eq!(cfg.database, "/srv/turnqr.sqlite");
        assert_eq!(cfg.decimal_separator, ".");

        assert!(upgrade_config_file(&file).unwrap().is_empty());
        fs::remove_dir_all(&dir).ok();
    }
}
