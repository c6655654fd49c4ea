use crate::core::aggregate::ClipMode;
use crate::errors::{AppError, AppResult};
use crate::export::ReportOptions;
use crate::utils::path::expand_tilde;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub mod migrate;

pub const DEFAULT_QR_BASE_URL: &str = "https://turnqr.local";

/// Contents of `~/.turnqr/turnqr.conf`. Every field has a default so older
/// files keep loading after new keys are introduced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: String,
    /// Principal used by `clock` and `history` when `--employee` is omitted.
    pub employee_id: Option<String>,
    pub decimal_separator: String,
    pub clip_mode: ClipMode,
    pub busy_timeout_ms: u64,
    pub qr_base_url: String,
    pub in_progress_label: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: Self::database_file().to_string_lossy().to_string(),
            employee_id: None,
            decimal_separator: ",".to_string(),
            clip_mode: ClipMode::default(),
            busy_timeout_ms: crate::db::pool::DEFAULT_BUSY_TIMEOUT_MS,
            qr_base_url: DEFAULT_QR_BASE_URL.to_string(),
            in_progress_label: "in progress".to_string(),
        }
    }
}

impl Config {
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".turnqr")
    }

    pub fn config_file() -> PathBuf {
        Self::config_dir().join("turnqr.conf")
    }

    pub fn database_file() -> PathBuf {
        Self::config_dir().join("turnqr.sqlite")
    }

    /// Where the last scanned check-in token is remembered.
    pub fn token_cache_file() -> PathBuf {
        Self::config_dir().join("point.token")
    }

    /// Load the configuration file, or defaults when it does not exist.
    pub fn load() -> AppResult<Self> {
        Self::load_from(&Self::config_file())
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let mut cfg: Config = serde_yaml::from_str(&content)
            .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?;
        cfg.database = expand_tilde(&cfg.database).to_string_lossy().to_string();
        Ok(cfg)
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        let yaml = serde_yaml::to_string(self).map_err(|e| AppError::Config(e.to_string()))?;
        fs::write(path, yaml)?;
        Ok(())
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            clip_mode: self.clip_mode,
            decimal_separator: self.decimal_separator.clone(),
            in_progress_label: self.in_progress_label.clone(),
        }
    }

    /// Create the config directory, write the config file (unless `is_test`)
    /// and return the database path to initialise.
    pub fn init_all(custom_db: Option<String>, is_test: bool) -> AppResult<PathBuf> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        let db_path = match custom_db {
            Some(name) => {
                let p = expand_tilde(&name);
                if p.is_absolute() { p } else { dir.join(p) }
            }
            None => Self::database_file(),
        };

        if !is_test {
            let config = Config {
                database: db_path.to_string_lossy().to_string(),
                ..Default::default()
            };
            config.save_to(&Self::config_file())?;
            println!("✅ Config file: {}", Self::config_file().display());
        }

        println!("✅ Database:    {}", db_path.display());
        Ok(db_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let dir = std::env::temp_dir().join(format!("turnqr_cfg_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join("turnqr.conf");
        fs::write(&file, "database: /tmp/x.sqlite\nclip_mode: symmetric\n").unwrap();

        let cfg = Config::load_from(&file).unwrap();
        assert_eq!(cfg.database, "/tmp/x.sqlite");
        assert_eq!(cfg.clip_mode, ClipMode::Symmetric);
        assert_eq!(cfg.decimal_separator, ",");
        assert_eq!(cfg.busy_timeout_ms, 5000);

        fs::write(&file, "clip_mode: sideways\n").unwrap();
        assert!(matches!(Config::load_from(&file), Err(AppError::Config(_))));
        fs::remove_dir_all(&dir).ok();
    }
}
