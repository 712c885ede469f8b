//! Persistent user preferences.

use dirs_next as dirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::body_parts::BodyPart;

/// Overrides the database location when set.
pub const DB_ENV_VAR: &str = "IRON_LOG_DB";

const DB_FILE: &str = "iron_log.sqlite3";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Tab {
    #[default]
    Body,
    Workout,
    Data,
}

/// User preferences stored as JSON in the config directory.
///
/// Every field has a default so files written by older versions keep
/// loading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub active_tab: Tab,
    pub last_body_part: BodyPart,
    /// Database file; the platform data directory is used when unset.
    pub db_path: Option<String>,
    /// Font with Japanese glyphs; common system locations are tried when
    /// unset.
    pub cjk_font_path: Option<String>,
    pub last_backup_dir: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            active_tab: Tab::Body,
            last_body_part: BodyPart::Chest,
            db_path: None,
            cjk_font_path: None,
            last_backup_dir: None,
        }
    }
}

impl Settings {
    const FILE: &'static str = "iron_log_settings.json";

    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(Self::FILE))
    }

    /// Load settings, falling back to defaults when the file is missing or
    /// unreadable.
    pub fn load() -> Self {
        if let Some(path) = Self::path() {
            if let Ok(data) = std::fs::read_to_string(&path) {
                match serde_json::from_str(&data) {
                    Ok(cfg) => return cfg,
                    Err(e) => log::warn!("Ignoring invalid settings file {}: {e}", path.display()),
                }
            }
        }
        Self::default()
    }

    pub fn save(&self) {
        if let Some(path) = Self::path() {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match serde_json::to_string_pretty(self) {
                Ok(data) => {
                    if let Err(e) = std::fs::write(&path, data) {
                        log::error!("Failed to save settings to {}: {e}", path.display());
                    }
                }
                Err(e) => log::error!("Failed to serialize settings: {e}"),
            }
        }
    }

    /// Database location: the `IRON_LOG_DB` environment variable, then the
    /// configured path, then the platform data directory.
    pub fn resolve_db_path(&self) -> PathBuf {
        if let Some(path) = std::env::var_os(DB_ENV_VAR).filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }
        if let Some(path) = self.db_path.as_deref().filter(|p| !p.trim().is_empty()) {
            return PathBuf::from(path);
        }
        dirs::data_dir()
            .map(|p| p.join("iron_log").join(DB_FILE))
            .unwrap_or_else(|| PathBuf::from(DB_FILE))
    }
}
