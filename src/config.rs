//! Settings file and per-user data directories.
//!
//! - settings: `<cache dir>/.rawterm/settings.json`
//! - logs (Linux): `$XDG_DATA_HOME/rawterm/logs` or `~/.local/share/rawterm/logs`
//! - logs (macOS): `~/Library/Application Support/rawterm/logs`

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::events::KeyDecoding;

const APP_NAME: &str = "rawterm";
const SETTINGS_DIR: &str = ".rawterm";
const SETTINGS_FILE: &str = "settings.json";
const LOG_DIR: &str = "logs";
const DISABLE_SETTINGS_ENV: &str = "RAWTERM_DISABLE_SETTINGS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_quit_key")]
    pub quit_key: char,
    #[serde(default)]
    pub key_decoding: KeyDecoding,
}

fn default_quit_key() -> char {
    'q'
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quit_key: default_quit_key(),
            key_decoding: KeyDecoding::default(),
        }
    }
}

pub fn parse_settings(text: &str) -> Result<Settings, serde_json::Error> {
    serde_json::from_str(text)
}

pub fn get_settings_path() -> Option<PathBuf> {
    get_cache_dir().map(|dir| dir.join(SETTINGS_DIR).join(SETTINGS_FILE))
}

/// Loads the settings file; a missing, unreadable or invalid file yields the
/// defaults.
pub fn load_settings() -> Settings {
    if std::env::var(DISABLE_SETTINGS_ENV).ok().as_deref() == Some("1") {
        return Settings::default();
    }
    let Some(path) = get_settings_path() else {
        return Settings::default();
    };
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(_) => return Settings::default(),
    };
    match parse_settings(&text) {
        Ok(settings) => {
            tracing::info!(path = %path.display(), "settings loaded");
            settings
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "invalid settings; using defaults");
            Settings::default()
        }
    }
}

pub fn get_log_dir() -> Option<PathBuf> {
    get_app_data_dir().map(|p| p.join(LOG_DIR))
}

pub fn ensure_log_dir() -> std::io::Result<PathBuf> {
    let dir = get_log_dir().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Cannot determine log directory",
        )
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }

    Ok(dir)
}

fn get_app_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME").ok().map(|home| {
            PathBuf::from(home)
                .join("Library/Application Support")
                .join(APP_NAME)
        })
    }

    #[cfg(not(target_os = "macos"))]
    {
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            Some(PathBuf::from(xdg).join(APP_NAME))
        } else {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".local/share").join(APP_NAME))
        }
    }
}

fn get_cache_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join("Library/Caches"))
    }

    #[cfg(not(target_os = "macos"))]
    {
        if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
            return Some(PathBuf::from(xdg));
        }
        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(".cache"))
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
