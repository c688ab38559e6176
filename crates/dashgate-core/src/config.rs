//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the secrets file location, the prompts file location,
//! and the last username that signed in.
//!
//! Configuration is stored at `~/.config/dashgate/config.json`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::prompts::DEFAULT_PROMPTS_PATH;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "dashgate";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default secrets file name inside the config directory
const SECRETS_FILE: &str = "secrets.json";

/// Cookie jar directory name inside the cache directory
const COOKIE_DIR: &str = "cookies";

/// Environment override for the secrets file
pub const SECRETS_ENV: &str = "DASHGATE_SECRETS";

/// Environment override for the prompts file
pub const PROMPTS_ENV: &str = "DASHGATE_PROMPTS";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub secrets_path: Option<PathBuf>,
    pub prompts_path: Option<PathBuf>,
    pub last_username: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            Ok(serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?)
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

    fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME))
    }

    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Secrets file: `DASHGATE_SECRETS`, then config, then the config directory
    pub fn secrets_path(&self) -> Result<PathBuf> {
        if let Some(path) = env_path(SECRETS_ENV) {
            return Ok(path);
        }
        if let Some(ref path) = self.secrets_path {
            return Ok(path.clone());
        }
        Ok(Self::config_dir()?.join(SECRETS_FILE))
    }

    /// Prompts file: `DASHGATE_PROMPTS`, then config, then `prompts/prompts.json`
    pub fn prompts_path(&self) -> PathBuf {
        env_path(PROMPTS_ENV)
            .or_else(|| self.prompts_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROMPTS_PATH))
    }

    pub fn cookie_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join(COOKIE_DIR))
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_paths_are_used() {
        let config = Config {
            secrets_path: Some(PathBuf::from("/etc/dashgate/secrets.json")),
            prompts_path: Some(PathBuf::from("/srv/prompts.json")),
            last_username: None,
        };
        if std::env::var_os(SECRETS_ENV).is_none() {
            assert_eq!(
                config.secrets_path().unwrap(),
                PathBuf::from("/etc/dashgate/secrets.json")
            );
        }
        if std::env::var_os(PROMPTS_ENV).is_none() {
            assert_eq!(config.prompts_path(), PathBuf::from("/srv/prompts.json"));
        }
    }

    #[test]
    fn test_default_prompts_path() {
        if std::env::var_os(PROMPTS_ENV).is_none() {
            assert_eq!(
                Config::default().prompts_path(),
                PathBuf::from(DEFAULT_PROMPTS_PATH)
            );
        }
    }

    #[test]
    fn test_config_round_trips_missing_fields() {
        let config: Config = serde_json::from_str(r#"{"last_username": "alice"}"#).unwrap();
        assert_eq!(config.last_username.as_deref(), Some("alice"));
        assert!(config.secrets_path.is_none());
    }
}
