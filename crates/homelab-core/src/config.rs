//! Application configuration management.
//!
//! Configuration covers where the service catalog lives, which tab opens
//! first, optional tab labels, and the offline cache policy.
//!
//! Configuration is stored at `~/.config/homelab-hub/config.json`. Every
//! field is optional; `HOMELAB_*` environment variables override the file.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "homelab-hub";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_SERVICES_URL: &str = "http://localhost:8080/services.json";
const DEFAULT_TAB: &str = "library";

/// Bumping this purges every older cache generation on the next start.
const DEFAULT_CACHE_GENERATION: &str = "homelab-v3";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub services_url: String,
    pub default_tab: String,
    /// Explicit tab bar. Empty means tabs are derived from the catalog.
    pub tabs: Vec<TabConfig>,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabConfig {
    pub key: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl TabConfig {
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.key)
    }
}

/// Offline cache policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Name of the current cache generation.
    pub generation: String,
    /// Resources fetched into the cache on install, relative to `services_url`.
    pub precache: Vec<String>,
    /// Path fragments that mark a resource as network-first.
    pub dynamic_resources: Vec<String>,
    /// Store static resources fetched on a cache miss.
    pub backfill_static: bool,
    /// Query parameter used to cache-bust catalog requests.
    pub cache_bust_param: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            services_url: DEFAULT_SERVICES_URL.to_string(),
            default_tab: DEFAULT_TAB.to_string(),
            tabs: Vec::new(),
            cache: CacheConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            generation: DEFAULT_CACHE_GENERATION.to_string(),
            precache: vec!["services.json".to_string()],
            dynamic_resources: vec!["services.json".to_string(), "script.js".to_string()],
            backfill_static: true,
            cache_bust_param: "t".to_string(),
        }
    }
}

impl Config {
    /// Load the config file (or defaults) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        debug!(?path, services_url = %config.services_url, "Config loaded");
        Ok(config)
    }

    /// Apply `HOMELAB_*` overrides from the given lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("HOMELAB_SERVICES_URL").filter(|v| !v.is_empty()) {
            self.services_url = url;
        }
        if let Some(tab) = lookup("HOMELAB_DEFAULT_TAB").filter(|v| !v.is_empty()) {
            self.default_tab = tab;
        }
        if let Some(generation) = lookup("HOMELAB_CACHE_GENERATION").filter(|v| !v.is_empty()) {
            self.cache.generation = generation;
        }
    }

    pub fn services_url(&self) -> Result<Url> {
        Url::parse(&self.services_url)
            .map_err(|e| anyhow::anyhow!("Invalid services_url {:?}: {}", self.services_url, e))
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
