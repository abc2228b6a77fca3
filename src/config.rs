//! Application configuration management.
//!
//! This module handles loading and saving the CLI configuration, which
//! includes the backend base URL, the last used email, and the remember-me
//! preference.
//!
//! Configuration is stored at `~/.config/booky/config.json`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "booky";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default backend base URL
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub base_url: Option<String>,
    pub last_email: Option<String>,
    #[serde(default)]
    pub remember_me: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Cache directory holding the persisted session file
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config: Config = serde_json::from_str("{}").expect("empty config should parse");
        assert!(config.base_url.is_none());
        assert!(config.last_email.is_none());
        assert!(!config.remember_me);
    }

    #[test]
    fn test_config_round_trip() {
        let config = Config {
            base_url: Some("https://booky.example.com".to_string()),
            last_email: Some("a@b.com".to_string()),
            remember_me: true,
        };
        let json = serde_json::to_string(&config).expect("config serializes");
        let back: Config = serde_json::from_str(&json).expect("config deserializes");
        assert_eq!(back.base_url.as_deref(), Some("https://booky.example.com"));
        assert!(back.remember_me);
    }
}
