//! Application configuration management.
//!
//! Configuration is stored at `~/.config/playbuddy/config.json`. Every field
//! is optional; `PLAYBUDDY_API_URL` and `PLAYBUDDY_CACHE_DIR` override the
//! file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_API_BASE_URL;
use crate::cache::OfflineLimits;
use crate::query::QueryOptions;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "playbuddy";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Subdirectory of the cache dir holding stored responses
const OFFLINE_DIR: &str = "offline";

pub const API_URL_ENV: &str = "PLAYBUDDY_API_URL";
pub const CACHE_DIR_ENV: &str = "PLAYBUDDY_CACHE_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: Option<String>,
    pub cache_dir: Option<PathBuf>,
    /// Keep the last good responses on disk for use without a network
    pub offline_enabled: bool,
    pub offline: OfflineLimits,
    /// Seconds cached data counts as fresh
    pub stale_time_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            cache_dir: None,
            offline_enabled: true,
            offline: OfflineLimits::default(),
            stale_time_secs: 0,
        }
    }
}

impl Config {
    /// Load the config file, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents).context("Failed to write config file")?;
        Ok(())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its
    /// value. Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(url) = lookup(API_URL_ENV) {
            self.api_url = Some(url);
        }
        if let Some(dir) = lookup(CACHE_DIR_ENV) {
            self.cache_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn offline_dir(&self) -> Result<PathBuf> {
        Ok(self.cache_dir()?.join(OFFLINE_DIR))
    }

    pub fn query_options(&self) -> QueryOptions {
        QueryOptions::default().with_stale_time(Duration::from_secs(self.stale_time_secs))
    }
}
