use std::path::{Path, PathBuf};
use std::time::Duration;

use caredesk_api::ApiClient;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const API_URL_ENV: &str = "CAREDESK_API_URL";
pub const TOKEN_ENV: &str = "CAREDESK_TOKEN";

/// Main configuration structure
///
/// Priority: CLI > Env > File > Defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl Config {
    /// Load from the default location, then apply env overrides
    pub fn load() -> crate::Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load one file; a missing file means defaults
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self) -> crate::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// `<config_dir>/caredesk/config.toml`
    pub fn config_path() -> crate::Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::Config("Could not find config directory".into()))?
            .join("caredesk");
        Ok(dir.join("config.toml"))
    }

    /// Env values beat the file; empty values are ignored
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = value(API_URL_ENV) {
            self.api.base_url = url;
        }
        if let Some(token) = value(TOKEN_ENV) {
            self.api.token = Some(token);
        }
    }

    /// Client for the configured backend, carrying the configured token if any
    pub fn api_client(&self) -> crate::Result<ApiClient> {
        let timeout = self.api.timeout_secs.map(Duration::from_secs);
        Ok(ApiClient::with_options(
            &self.api.base_url,
            self.api.token.clone(),
            timeout,
        )?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// No timeout unless set
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Static token, mostly for scripting; a login session wins over it
    #[serde(default)]
    pub token: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
            token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Rows shown per page by `caredesk list`
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default = "default_true")]
    pub show_stats: bool,
}

fn default_page_size() -> usize {
    50
}

fn default_true() -> bool {
    true
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            show_stats: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_valid_for_days")]
    pub valid_for_days: i64,
}

fn default_valid_for_days() -> i64 {
    7
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            valid_for_days: default_valid_for_days(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:5000");
        assert_eq!(config.api.timeout_secs, None);
        assert_eq!(config.ui.page_size, 50);
        assert_eq!(config.session.valid_for_days, 7);
    }

    #[test]
    fn test_missing_file_is_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api]\nbase_url = \"https://ngo.example\"\ntimeout_secs = 20\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api.base_url, "https://ngo.example");
        assert_eq!(config.api.timeout_secs, Some(20));
        assert_eq!(config.ui, UiConfig::default());
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api\nbase_url = ").unwrap();
        assert!(matches!(Config::load_from(&path), Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.session.valid_for_days = 30;

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::default();
        config.apply_env(|key| match key {
            API_URL_ENV => Some("https://staging.example".to_string()),
            TOKEN_ENV => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.api.base_url, "https://staging.example");
        assert_eq!(config.api.token, None);
    }
}
