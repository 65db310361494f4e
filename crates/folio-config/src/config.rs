//! Client configuration.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Default REST API base URL (can be overridden at compile time via FOLIO_API_URL).
pub const DEFAULT_API_URL: &str = match option_env!("FOLIO_API_URL") {
    Some(url) => url,
    None => "http://localhost:3000/api",
};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Client configuration, persisted at `~/.folio/config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// REST API base URL; request paths are joined onto it.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Override for the persisted storage file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_file: Option<PathBuf>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            api_url: default_api_url(),
            storage_file: None,
        }
    }
}

impl Config {
    /// Load from `paths.config_file()` if it exists, then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to `paths.config_file()`.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Apply `FOLIO_API_URL` and `FOLIO_LOG_LEVEL` from `lookup`; blank values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(api_url) = non_empty("FOLIO_API_URL") {
            self.api_url = api_url;
        }
        if let Some(log_level) = non_empty("FOLIO_LOG_LEVEL") {
            self.log_level = log_level;
        }
    }

    /// The API base URL, parsed.
    pub fn api_url(&self) -> CoreResult<Url> {
        let url = Url::parse(&self.api_url)?;
        if url.cannot_be_a_base() {
            return Err(CoreError::Config(format!(
                "API URL cannot be used as a base: {}",
                self.api_url
            )));
        }
        Ok(url)
    }

    /// The persisted storage file, defaulting to `paths.storage_file()`.
    pub fn storage_file(&self, paths: &Paths) -> PathBuf {
        self.storage_file
            .clone()
            .unwrap_or_else(|| paths.storage_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.storage_file.is_none());
    }

    #[test]
    fn test_config_load_from_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, r#"{ "log_level": "debug" }"#).unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let config = Config {
            log_level: "trace".to_string(),
            api_url: "https://books.example.com/api".to_string(),
            storage_file: Some(dir.path().join("elsewhere.json")),
        };
        config.save(&paths).unwrap();

        let loaded = Config::load_from_file(&paths.config_file()).unwrap();
        assert_eq!(loaded.log_level, "trace");
        assert_eq!(loaded.api_url, "https://books.example.com/api");
        assert_eq!(loaded.storage_file(&paths), dir.path().join("elsewhere.json"));
    }

    #[test]
    fn test_config_load_nonexistent_uses_defaults() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let config = Config::load(&paths).unwrap();
        assert!(config.storage_file.is_none());
        assert_eq!(config.storage_file(&paths), paths.storage_file());
    }

    #[test]
    fn test_overrides_apply_and_skip_blank() {
        let env: HashMap<&str, &str> = [
            ("FOLIO_API_URL", "https://staging.example.com/api"),
            ("FOLIO_LOG_LEVEL", "  "),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.api_url, "https://staging.example.com/api");
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_api_url_parse() {
        let config = Config::default();
        let url = config.api_url().unwrap();
        assert!(url.scheme().starts_with("http"));
    }

    #[test]
    fn test_api_url_rejects_invalid() {
        let mut config = Config::default();
        config.api_url = "not a valid url".to_string();
        assert!(config.api_url().is_err());

        config.api_url = "mailto:someone@example.com".to_string();
        assert!(matches!(config.api_url(), Err(CoreError::Config(_))));
    }
}
