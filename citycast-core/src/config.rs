use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::provider::{geodb, openmeteo};

/// Environment variable that overrides the directory API key from the config file.
pub const API_KEY_ENV: &str = "CITYCAST_GEODB_API_KEY";

/// City directory (GeoDB Cities on RapidAPI) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub base_url: String,
    pub api_host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: geodb::DEFAULT_BASE_URL.to_string(),
            api_host: geodb::DEFAULT_API_HOST.to_string(),
            api_key: None,
        }
    }
}

/// Forecast service (Open-Meteo) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub base_url: String,
    /// Also request hourly humidity and wind speed.
    pub extended_hourly: bool,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            base_url: openmeteo::DEFAULT_BASE_URL.to_string(),
            extended_hourly: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Overrides the platform cache directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// "custom-range" or "next-24h".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_mode: Option<String>,

    /// Example TOML:
    /// [directory]
    /// api_key = "..."
    pub directory: DirectoryConfig,

    pub forecast: ForecastConfig,

    pub cache: CacheConfig,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "citycast", "citycast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Directory holding the persisted location cache.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        match &self.cache.dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::project_dirs()?.cache_dir().join("locations")),
        }
    }

    /// API key from the environment, falling back to the config file.
    pub fn directory_api_key(&self) -> Option<String> {
        pick_api_key(std::env::var(API_KEY_ENV).ok(), self.directory.api_key.as_deref())
    }

    pub fn set_directory_api_key(&mut self, api_key: String) {
        self.directory.api_key = Some(api_key);
    }

    pub fn set_default_mode(&mut self, mode: &str) {
        self.default_mode = Some(mode.to_string());
    }
}

fn pick_api_key(env: Option<String>, file: Option<&str>) -> Option<String> {
    env.filter(|k| !k.trim().is_empty())
        .or_else(|| file.filter(|k| !k.trim().is_empty()).map(str::to_string))
}
