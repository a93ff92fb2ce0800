//! Durable per-device values: the visitor identifier and the pricing region.
//!
//! Stored as a flat JSON object so the same keys can be shared with a
//! browser's local storage.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::Rng;
use tracing::{debug, info};

pub const UID_KEY: &str = "pdd_uid";
pub const REGION_KEY: &str = "pdd_region";

const UID_PREFIX: &str = "ID-";
const UID_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Region {
    #[default]
    Zar,
    Intl,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Zar => "ZAR",
            Region::Intl => "INTL",
        }
    }

    /// Anything but `INTL` reads as the home region.
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("INTL") {
            Region::Intl
        } else {
            Region::Zar
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Region::Zar => Region::Intl,
            Region::Intl => Region::Zar,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `ID-` followed by nine upper-case base-36 characters.
pub fn generate_uid<R: Rng + ?Sized>(rng: &mut R) -> String {
    let body: String = (0..UID_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}{}", UID_PREFIX, body)
}

pub struct DeviceStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl DeviceStore {
    /// Open the store at `path`; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), keys = values.len(), "Opened device store");
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        self.values.insert(key.to_string(), value.into());
        self.save()
    }

    pub fn identity(&self) -> Option<&str> {
        self.get(UID_KEY)
    }

    /// Return the stored identifier, creating and persisting one if absent.
    pub fn ensure_identity<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<String> {
        if let Some(uid) = self.identity() {
            return Ok(uid.to_string());
        }
        let uid = generate_uid(rng);
        self.set(UID_KEY, uid.clone())?;
        info!(uid = %uid, "Created device identity");
        Ok(uid)
    }

    pub fn region(&self) -> Region {
        self.get(REGION_KEY).map(Region::parse).unwrap_or_default()
    }

    pub fn toggle_region(&mut self) -> Result<Region> {
        let next = self.region().toggled();
        self.set(REGION_KEY, next.as_str())?;
        Ok(next)
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}
