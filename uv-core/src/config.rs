use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

use crate::retry::RetryPolicy;

/// Top-level configuration, built once at startup and passed into every component.
///
/// Example TOML:
/// ```toml
/// default_city = "Delhi"
///
/// [provider]
/// timezone = "Asia/Kolkata"
///
/// [remote]
/// url = "https://xyz.supabase.co"
/// api_key = "..."
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub default_city: String,
    pub provider: ProviderConfig,
    pub retry: RetryConfig,
    pub storage: StorageConfig,
    /// Remote mirror; `None` means local-only.
    pub remote: Option<RemoteConfig>,
    pub registry: RegistryConfig,
    pub batch: BatchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_city: "Delhi".to_string(),
            provider: ProviderConfig::default(),
            retry: RetryConfig::default(),
            storage: StorageConfig::default(),
            remote: None,
            registry: RegistryConfig::default(),
            batch: BatchConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub timezone: String,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com/v1".to_string(),
            timezone: "Asia/Kolkata".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay_ms: 1000 }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.base_delay_ms))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Falls back to the platform data directory when unset.
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub url: String,
    pub api_key: String,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_cities_table")]
    pub cities_table: String,
    #[serde(default = "default_remote_timeout")]
    pub timeout_secs: u64,
}

fn default_table() -> String {
    "uv_index".to_string()
}

fn default_cities_table() -> String {
    "cities".to_string()
}

fn default_remote_timeout() -> u64 {
    15
}

impl RemoteConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            table: default_table(),
            cities_table: default_cities_table(),
            timeout_secs: default_remote_timeout(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty() && !self.api_key.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrySource {
    #[default]
    Static,
    Remote,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub source: RegistrySource,
    /// Added on top of the compiled-in city table.
    pub extra_cities: Vec<CityEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityEntry {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub delay_secs: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { delay_secs: 2 }
    }
}

impl Config {
    /// Load config from `path` (or the platform default), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(path) => Self::read_file(path)?,
            None => {
                let path = Self::config_file_path()?;
                if path.exists() {
                    Self::read_file(&path)?
                } else {
                    // First run: no config file, use defaults.
                    Self::default()
                }
            }
        };

        cfg.apply_env(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Overlay `SUPABASE_*` and `UV_DB_PATH` values provided by `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let (Some(url), Some(key)) = (non_empty("SUPABASE_URL"), non_empty("SUPABASE_KEY")) {
            match self.remote.as_mut() {
                Some(remote) => {
                    remote.url = url;
                    remote.api_key = key;
                }
                None => self.remote = Some(RemoteConfig::new(url, key)),
            }
        }

        if let (Some(table), Some(remote)) = (non_empty("SUPABASE_TABLE"), self.remote.as_mut()) {
            remote.table = table;
        }

        if let Some(db_path) = non_empty("UV_DB_PATH") {
            self.storage.db_path = Some(PathBuf::from(db_path));
        }
    }

    /// Remote settings, but only when both url and key are present.
    pub fn remote(&self) -> Option<&RemoteConfig> {
        self.remote.as_ref().filter(|r| r.is_configured())
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(p) => Ok(p.clone()),
            None => Ok(Self::project_dirs()?.data_dir().join("uv_data.db")),
        }
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "uv-index", "uv-index")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }
}
