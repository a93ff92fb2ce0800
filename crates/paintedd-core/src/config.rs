//! Application configuration management.
//!
//! Holds the site to load data from, the offline cache policy and the
//! checkout contact overrides.
//!
//! Configuration is stored at `~/.config/paintedd/config.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cache::CachePolicy;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "paintedd";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Device values file name, inside the cache directory
const DEVICE_FILE: &str = "device.json";

pub const DEFAULT_SITE_URL: &str = "https://paintedd.art/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site_url: String,
    /// Overrides the WhatsApp number from the site's data files
    pub whatsapp_number: Option<String>,
    pub cache: CachePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_url: DEFAULT_SITE_URL.to_string(),
            whatsapp_number: None,
            cache: CachePolicy::with_origin(DEFAULT_SITE_URL),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents).with_context(|| format!("Invalid config at {}", path.display()))
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
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Point both data loading and the cache at another site.
    pub fn set_site_url(&mut self, url: &str) {
        self.site_url = url.to_string();
        self.cache.origin = url.to_string();
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn device_path(&self) -> Result<PathBuf> {
        Ok(self.cache_dir()?.join(DEVICE_FILE))
    }
}
