use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;

use crate::models::settings::AppConfig;

/// Overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "WEEKLY_SCHEDULE_CONFIG";

const CONFIG_FILE_NAME: &str = "config.toml";
const DATABASE_FILE_NAME: &str = "schedule.db";

pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Uses `$WEEKLY_SCHEDULE_CONFIG` when set, otherwise the platform
    /// config directory, otherwise `config.toml` in the working directory.
    pub fn from_environment() -> Self {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|value| !value.is_empty()) {
            return Self::new(path);
        }

        let path = project_dirs()
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and validates the config. A missing file yields defaults.
    pub fn load(&self) -> Result<AppConfig> {
        if !self.path.exists() {
            log::info!("No config at {}, using defaults", self.path.display());
            return Ok(AppConfig::default());
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read config from {}", self.path.display()))?;
        let config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config at {}", self.path.display()))?;

        config
            .validate()
            .map_err(|e| anyhow!("Invalid config {}: {}", self.path.display(), e))?;

        Ok(config)
    }

    pub fn save(&self, config: &AppConfig) -> Result<()> {
        config
            .validate()
            .map_err(|e| anyhow!("Invalid config: {}", e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create dir {}", parent.display()))?;
        }

        let data = toml::to_string_pretty(config).context("Failed to serialize config")?;
        fs::write(&self.path, data)
            .with_context(|| format!("Failed to write config to {}", self.path.display()))?;
        Ok(())
    }
}

/// SQLite file for local storage: the configured path, else the platform
/// data directory, else `schedule.db` in the working directory.
pub fn resolve_database_path(config: &AppConfig) -> Result<PathBuf> {
    if let Some(path) = &config.database_path {
        return Ok(path.clone());
    }

    match project_dirs() {
        Some(dirs) => {
            let data_dir = dirs.data_dir();
            fs::create_dir_all(data_dir).with_context(|| {
                format!("Failed to create data directory {}", data_dir.display())
            })?;
            Ok(data_dir.join(DATABASE_FILE_NAME))
        }
        None => Ok(PathBuf::from(DATABASE_FILE_NAME)),
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "WeeklySchedule", "WeeklySchedule")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::settings::RealtimeSettings;
    use serial_test::serial;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let service = ConfigService::new(dir.path().join("config.toml"));
        assert_eq!(service.load().unwrap(), AppConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let service = ConfigService::new(dir.path().join("nested").join("config.toml"));

        let config = AppConfig {
            desktop_notifications: true,
            notice_duration_secs: 5,
            realtime: Some(RealtimeSettings {
                database_url: "https://demo-default-rtdb.firebaseio.com".to_string(),
                auth_token: Some("secret".to_string()),
            }),
            ..AppConfig::default()
        };

        service.save(&config).unwrap();
        assert_eq!(service.load().unwrap(), config);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "notice_duration_secs = 0\n").unwrap();

        assert!(ConfigService::new(path).load().is_err());
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "storage_key = [").unwrap();

        assert!(ConfigService::new(path).load().is_err());
    }

    #[test]
    fn test_configured_database_path_wins() {
        let config = AppConfig {
            database_path: Some(PathBuf::from("/tmp/custom.db")),
            ..AppConfig::default()
        };
        assert_eq!(resolve_database_path(&config).unwrap(), PathBuf::from("/tmp/custom.db"));
    }

    #[test]
    #[serial]
    fn test_env_var_overrides_config_path() {
        std::env::set_var(CONFIG_ENV_VAR, "/tmp/weekly-schedule-test.toml");
        let service = ConfigService::from_environment();
        std::env::remove_var(CONFIG_ENV_VAR);

        assert_eq!(service.path(), Path::new("/tmp/weekly-schedule-test.toml"));
    }

    #[test]
    #[serial]
    fn test_default_path_ends_with_config_file() {
        std::env::remove_var(CONFIG_ENV_VAR);
        let service = ConfigService::from_environment();
        assert!(service.path().ends_with("config.toml"));
    }
}
