use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Currency symbol used when neither the business nor the event sets one
pub const DEFAULT_CURRENCY: &str = "R";

/// WhatsApp number used when neither the business nor the event sets one
pub const DEFAULT_WHATSAPP: &str = "27641417574";

/// The global defaults file: business metadata plus pricing blueprints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalData {
    #[serde(default)]
    pub business: Metadata,
    #[serde(default)]
    pub defaults: Defaults,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default)]
    pub blueprints: Blueprints,
}

/// Free-form metadata object. Only a handful of keys are interpreted;
/// everything else is carried along so later layers can still override it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub currency: Option<String>,
    pub whatsapp_default: Option<String>,
    pub event_name: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Metadata {
    /// Overlay `other` on top of `self`; keys present in `other` win.
    pub fn merge(&mut self, other: &Metadata) {
        if other.currency.is_some() {
            self.currency = other.currency.clone();
        }
        if other.whatsapp_default.is_some() {
            self.whatsapp_default = other.whatsapp_default.clone();
        }
        if other.event_name.is_some() {
            self.event_name = other.event_name.clone();
        }
        for (key, value) in &other.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }

    pub fn currency(&self) -> &str {
        self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)
    }

    pub fn whatsapp_number(&self) -> &str {
        self.whatsapp_default
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_WHATSAPP)
    }

    pub fn event_name(&self) -> &str {
        self.event_name.as_deref().unwrap_or("Event")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintSize {
    pub label: String,
    /// Flat starting price for this size
    pub base: f64,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperTier {
    pub label: String,
    /// Multiplier applied to the size price
    pub tier: f64,
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootBlueprint {
    pub label: String,
    pub price: f64,
}

/// Global pricing definitions shared by every artwork.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Blueprints {
    #[serde(default)]
    pub print_sizes: BTreeMap<String, PrintSize>,
    #[serde(default)]
    pub print_papers: BTreeMap<String, PaperTier>,
    #[serde(default)]
    pub loot: BTreeMap<String, LootBlueprint>,
}

impl Blueprints {
    pub fn print_size(&self, code: &str) -> Option<&PrintSize> {
        self.print_sizes.get(code)
    }

    pub fn loot(&self, kind: &str) -> Option<&LootBlueprint> {
        self.loot.get(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLOBAL_JSON: &str = r#"{
        "business": {"currency": "R", "whatsapp_default": "27000000000", "name": "Paintedd"},
        "defaults": {"blueprints": {
            "print_sizes": {"A4": {"label": "A4", "base": 50, "code": "A4"}},
            "print_papers": {"matte": {"label": "Matte", "tier": 1.0, "code": "MT"}},
            "loot": {"sticker": {"label": "Sticker", "price": 40}}
        }}
    }"#;

    #[test]
    fn test_parse_global_data() {
        let global: GlobalData = serde_json::from_str(GLOBAL_JSON).unwrap();
        assert_eq!(global.business.whatsapp_number(), "27000000000");
        assert_eq!(global.business.extra.get("name"), Some(&Value::from("Paintedd")));

        let bp = &global.defaults.blueprints;
        assert_eq!(bp.print_size("A4").map(|s| s.base), Some(50.0));
        assert_eq!(bp.loot("sticker").map(|l| l.price), Some(40.0));
        assert!(bp.print_size("A0").is_none());
    }

    #[test]
    fn test_metadata_merge_later_layer_wins() {
        let mut meta = Metadata::default();
        assert_eq!(meta.currency(), DEFAULT_CURRENCY);
        assert_eq!(meta.event_name(), "Event");

        let business = Metadata {
            currency: Some("ZAR".to_string()),
            whatsapp_default: Some("111".to_string()),
            ..Default::default()
        };
        let event = Metadata {
            event_name: Some("CCC Town".to_string()),
            whatsapp_default: Some("222".to_string()),
            ..Default::default()
        };
        meta.merge(&business);
        meta.merge(&event);

        assert_eq!(meta.currency(), "ZAR");
        assert_eq!(meta.whatsapp_number(), "222");
        assert_eq!(meta.event_name(), "CCC Town");
    }
}
