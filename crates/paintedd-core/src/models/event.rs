use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::lenient::skip_malformed;
use super::Metadata;

/// Per-event file: metadata, theme colours, pricing overrides and inventory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventData {
    #[serde(default)]
    pub meta: Metadata,
    pub theme: Option<Theme>,
    /// Loot prices that replace the global blueprint price for this event,
    /// keyed by loot type (`sticker`, `button`, ...). `null` means no override.
    #[serde(default)]
    pub pricing_overrides: BTreeMap<String, Option<f64>>,
    #[serde(default, deserialize_with = "skip_malformed")]
    pub inventory: Vec<InventoryListing>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Theme {
    pub primary: Option<String>,
    pub accent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryListing {
    pub id: String,
    pub config: Option<ListingConfig>,
}

/// Which products an event offers for one artwork.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingConfig {
    pub original: Option<OriginalConfig>,
    #[serde(default)]
    pub prints: Vec<PrintChoice>,
    pub sticker: Option<LootConfig>,
    pub button: Option<LootConfig>,
}

impl ListingConfig {
    /// Loot entries in display order
    pub fn loot(&self) -> [(&'static str, Option<&LootConfig>); 2] {
        [("sticker", self.sticker.as_ref()), ("button", self.button.as_ref())]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginalConfig {
    /// Sold originals often leave the price out
    pub price: Option<f64>,
    pub available: Option<bool>,
}

impl OriginalConfig {
    pub fn is_available(&self) -> bool {
        self.available != Some(false)
    }
}

/// A print size offered for an artwork: either a blueprint code (`"A4"`)
/// or an inline definition with its own price. Inline sizes may give only
/// a `label`, which then doubles as the size code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrintChoice {
    Code(String),
    Custom {
        size: Option<String>,
        label: Option<String>,
        price_override: Option<f64>,
    },
}

/// `true` enables the item at blueprint values; an object adjusts it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LootConfig {
    Enabled(bool),
    Custom(LootOverride),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LootOverride {
    pub price_override: Option<f64>,
    pub available: Option<bool>,
    pub tag: Option<String>,
}

impl LootConfig {
    pub fn is_offered(&self) -> bool {
        !matches!(self, LootConfig::Enabled(false))
    }

    pub fn overrides(&self) -> LootOverride {
        match self {
            LootConfig::Custom(o) => o.clone(),
            LootConfig::Enabled(_) => LootOverride::default(),
        }
    }
}
