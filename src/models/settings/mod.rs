// Settings module
// Application configuration loaded from config.toml

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_STORAGE_KEY: &str = "personalWebsiteSchedule";
pub const DEFAULT_REMOTE_PATH: &str = "schedule";

/// Connection details for the hosted realtime database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeSettings {
    pub database_url: String,
    #[serde(default)]
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Key the serialized grid is stored under in local storage.
    pub storage_key: String,
    /// Path of the grid inside the realtime database.
    pub remote_path: String,
    /// SQLite file backing local storage. Defaults to the platform data dir.
    pub database_path: Option<PathBuf>,
    pub desktop_notifications: bool,
    pub notice_duration_secs: u64,
    /// Absent means local-only mode.
    pub realtime: Option<RealtimeSettings>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            remote_path: DEFAULT_REMOTE_PATH.to_string(),
            database_path: None,
            desktop_notifications: false,
            notice_duration_secs: 3,
            realtime: None,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.storage_key.trim().is_empty() {
            return Err("Storage key cannot be empty".to_string());
        }

        let remote_path = self.remote_path.trim().trim_matches('/');
        if remote_path.is_empty() {
            return Err("Remote path cannot be empty".to_string());
        }

        if self.notice_duration_secs == 0 {
            return Err("Notice duration must be greater than 0 seconds".to_string());
        }

        if let Some(realtime) = &self.realtime {
            if !realtime.database_url.trim().starts_with("https://") {
                return Err("Realtime database URL must use HTTPS".to_string());
            }
        }

        Ok(())
    }
}
