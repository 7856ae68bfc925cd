//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::ingestion::{DatasetSource, default_datasets};
use crate::error::Error;
use crate::infrastructure::source::DEFAULT_TIMEOUT_SECS;
use crate::storage::database::{DEFAULT_MAX_CONNECTIONS, default_database_path};

/// Environment variable holding the ingestion API key
pub const API_KEY_ENV: &str = "GLOSSARY_API_KEY";

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "GLOSSARY_CONFIG_DIR";

/// Glossary configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub ingestion: IngestionConfig,
    pub search: SearchConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_path: PathBuf,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Download cache directory
    pub data_dir: PathBuf,
    pub timeout_secs: u64,
    pub datasets: Vec<DatasetSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            datasets: default_datasets(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            case_sensitive: true,
        }
    }
}

/// Default download cache directory
pub fn default_data_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_dir() {
        data_dir.join("glossary").join("datasets")
    } else {
        PathBuf::from("datasets")
    }
}

impl ApiConfig {
    pub fn resolved_api_key(&self) -> anyhow::Result<Option<String>> {
        self.enforce_env_only()?;

        Ok(env::var(API_KEY_ENV).ok().filter(|key| !key.is_empty()))
    }

    pub fn redacted_api_key(&self) -> anyhow::Result<Option<String>> {
        self.resolved_api_key().map(|opt| opt.map(|key| redact(&key)))
    }

    pub fn enforce_env_only(&self) -> anyhow::Result<()> {
        if self.api_key.is_some() {
            return Err(anyhow!(
                "API keys must be provided via environment variables, not stored in configuration"
            ));
        }
        Ok(())
    }

    /// Check a caller-supplied key against the configured one
    pub fn authorize(&self, provided: Option<&str>) -> crate::Result<()> {
        let expected = self
            .resolved_api_key()
            .map_err(|e| Error::ConfigError(e.to_string()))?;
        check_api_key(expected.as_deref(), provided)
    }
}

fn redact(key: &str) -> String {
    match key.char_indices().rev().nth(3) {
        Some((start, _)) if start > 0 => format!("***{}", &key[start..]),
        _ => "***".to_string(),
    }
}

fn check_api_key(expected: Option<&str>, provided: Option<&str>) -> crate::Result<()> {
    let expected = expected.ok_or_else(|| Error::MissingApiKey(API_KEY_ENV.to_string()))?;
    match provided {
        Some(key) if key == expected => Ok(()),
        _ => Err(Error::InvalidApiKey),
    }
}

fn parse_bool(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(anyhow!("Invalid boolean value: {}", value)),
    }
}

/// Parse `name=url` pairs separated by commas
fn parse_datasets(value: &str) -> anyhow::Result<Vec<DatasetSource>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, url) = entry
                .split_once('=')
                .ok_or_else(|| anyhow!("Invalid dataset entry '{}', expected name=url", entry))?;
            Ok(DatasetSource::new(name.trim(), url.trim()))
        })
        .collect()
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var(CONFIG_DIR_ENV) {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("glossary")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or fall back to defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        self.validate()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        self.api.enforce_env_only()?;

        if self.storage.max_connections == 0 {
            return Err(anyhow!("storage.max_connections must be at least 1"));
        }
        if self.ingestion.timeout_secs == 0 {
            return Err(anyhow!("ingestion.timeout_secs must be at least 1"));
        }

        let mut names = HashSet::new();
        for dataset in &self.ingestion.datasets {
            if dataset.name.is_empty() || dataset.url.is_empty() {
                return Err(anyhow!("Datasets need both a name and a url"));
            }
            if !names.insert(dataset.name.as_str()) {
                return Err(anyhow!("Duplicate dataset name: {}", dataset.name));
            }
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            // Storage settings
            "storage.database_path" => Ok(self.storage.database_path.display().to_string()),
            "storage.max_connections" => Ok(self.storage.max_connections.to_string()),

            // Ingestion settings
            "ingestion.data_dir" => Ok(self.ingestion.data_dir.display().to_string()),
            "ingestion.timeout_secs" => Ok(self.ingestion.timeout_secs.to_string()),
            "ingestion.datasets" => Ok(self
                .ingestion
                .datasets
                .iter()
                .map(|d| format!("{}={}", d.name, d.url))
                .collect::<Vec<_>>()
                .join(", ")),

            // Search settings
            "search.case_sensitive" => Ok(self.search.case_sensitive.to_string()),

            // API key (shown redacted)
            "api.api_key" | "api_key" => match self.api.redacted_api_key()? {
                Some(redacted) => Ok(redacted),
                None => Ok(format!("(not set - use {} env var)", API_KEY_ENV)),
            },

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `glossary config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "storage.database_path" => {
                self.storage.database_path = PathBuf::from(value);
            }
            "storage.max_connections" => {
                let max: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid max_connections value: {}", value))?;
                if max == 0 {
                    return Err(anyhow!("max_connections must be at least 1"));
                }
                self.storage.max_connections = max;
            }

            "ingestion.data_dir" => {
                self.ingestion.data_dir = PathBuf::from(value);
            }
            "ingestion.timeout_secs" => {
                let secs: u64 = value
                    .parse()
                    .with_context(|| format!("Invalid timeout_secs value: {}", value))?;
                if secs == 0 {
                    return Err(anyhow!("timeout_secs must be at least 1"));
                }
                self.ingestion.timeout_secs = secs;
            }
            "ingestion.datasets" => {
                self.ingestion.datasets = parse_datasets(value)?;
            }

            "search.case_sensitive" => {
                self.search.case_sensitive = parse_bool(value)?;
            }

            // API key cannot be set via config
            "api.api_key" | "api_key" => {
                return Err(anyhow!(
                    "API keys cannot be stored in configuration for security. \
                     Set the {} environment variable instead.",
                    API_KEY_ENV
                ));
            }

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `glossary config list` to see available keys.",
                    key
                ));
            }
        }
        self.validate()
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = [
            "storage.database_path",
            "storage.max_connections",
            "ingestion.data_dir",
            "ingestion.timeout_secs",
            "ingestion.datasets",
            "search.case_sensitive",
            "api.api_key",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        Self::reset_at(&Self::config_path()?)
    }

    pub fn reset_at(path: &Path) -> anyhow::Result<()> {
        if path.exists() {
            fs::remove_file(path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.storage.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert!(config.storage.database_path.ends_with("glossary.db"));
        assert_eq!(config.ingestion.timeout_secs, 10);
        assert_eq!(config.ingestion.datasets.len(), 8);
        assert!(config.search.case_sensitive);
        assert!(config.api.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.set("search.case_sensitive", "false").unwrap();
        config.set("ingestion.datasets", "a.rdf=file:///tmp/a.rdf").unwrap();
        config.save_to(&path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("api_key"));

        let loaded = Config::load_from(&path).unwrap();
        assert!(!loaded.search.case_sensitive);
        assert_eq!(
            loaded.ingestion.datasets,
            vec![DatasetSource::new("a.rdf", "file:///tmp/a.rdf")]
        );
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.ingestion.datasets, default_datasets());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[search]\ncase_sensitive = false\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(!config.search.case_sensitive);
        assert_eq!(config.ingestion.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.ingestion.datasets.len(), 8);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[storage]\nmax_connections = 0\n").unwrap();
        assert!(Config::load_from(&path).is_err());

        fs::write(&path, "not = [valid").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_get_and_set() {
        let mut config = Config::default();

        config.set("storage.max_connections", "3").unwrap();
        assert_eq!(config.get("storage.max_connections").unwrap(), "3");

        config.set("ingestion.timeout_secs", "30").unwrap();
        assert_eq!(config.get("ingestion.timeout_secs").unwrap(), "30");

        config.set("ingestion.data_dir", "/tmp/cache").unwrap();
        assert_eq!(config.get("ingestion.data_dir").unwrap(), "/tmp/cache");

        config
            .set("ingestion.datasets", "a.rdf=file:///a.rdf, b.rdf=https://example.org/b.rdf")
            .unwrap();
        assert_eq!(
            config.get("ingestion.datasets").unwrap(),
            "a.rdf=file:///a.rdf, b.rdf=https://example.org/b.rdf"
        );
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.set("storage.max_connections", "0").is_err());
        assert!(config.set("ingestion.timeout_secs", "soon").is_err());
        assert!(config.set("search.case_sensitive", "maybe").is_err());
        assert!(config.set("ingestion.datasets", "no-separator").is_err());
        assert!(config.set("ingestion.datasets", "a=x, a=y").is_err());
        assert!(config.set("unknown.key", "1").is_err());
    }

    #[test]
    fn test_api_key_cannot_be_set() {
        let mut config = Config::default();
        let error = config.set("api.api_key", "secret").unwrap_err();
        assert!(error.to_string().contains(API_KEY_ENV));
    }

    #[test]
    fn test_stored_api_key_is_rejected() {
        let mut config = Config::default();
        config.api.api_key = Some("secret".to_string());
        assert!(config.validate().is_err());
        assert!(matches!(
            config.api.authorize(Some("secret")),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_list_covers_every_key() {
        let config = Config::default();
        let entries = config.list().unwrap();
        assert_eq!(entries.len(), 7);
        assert!(entries.iter().any(|(key, _)| key == "api.api_key"));
    }

    #[test]
    fn test_check_api_key() {
        assert!(check_api_key(Some("secret"), Some("secret")).is_ok());
        assert!(matches!(
            check_api_key(Some("secret"), Some("guess")),
            Err(Error::InvalidApiKey)
        ));
        assert!(matches!(
            check_api_key(Some("secret"), None),
            Err(Error::InvalidApiKey)
        ));

        let missing = check_api_key(None, Some("secret")).unwrap_err();
        assert_eq!(missing.code(), "E500");
        assert_eq!(
            missing.to_string(),
            "The API key is missing for: GLOSSARY_API_KEY."
        );
    }

    #[test]
    fn test_redact() {
        assert_eq!(redact("abc"), "***");
        assert_eq!(redact("abcd"), "***");
        assert_eq!(redact("sk-12345678"), "***5678");
    }

    #[test]
    fn test_reset_at_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        Config::default().save_to(&path).unwrap();
        assert!(path.exists());

        Config::reset_at(&path).unwrap();
        assert!(!path.exists());
        Config::reset_at(&path).unwrap();
    }
}
