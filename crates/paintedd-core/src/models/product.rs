use serde::{Deserialize, Serialize};

/// How a variant option changes the price.
///
/// Size options add a flat amount; paper tiers scale the running total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PriceModifier {
    Flat(f64),
    Multiplier(f64),
}

impl PriceModifier {
    pub fn value(&self) -> f64 {
        match self {
            PriceModifier::Flat(v) | PriceModifier::Multiplier(v) => *v,
        }
    }

    /// Short hint shown next to an option label, e.g. `+R80`.
    /// Multipliers get no hint.
    pub fn hint(&self, currency: &str) -> Option<String> {
        match self {
            PriceModifier::Flat(v) if *v > 0.0 => Some(format!("+{}{}", currency, v.round() as i64)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct VariantOption {
    pub label: String,
    pub modifier: PriceModifier,
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct VariantDimension {
    pub name: String,
    pub options: Vec<VariantOption>,
}

impl VariantDimension {
    pub fn option(&self, label: &str) -> Option<&VariantOption> {
        self.options.iter().find(|o| o.label.eq_ignore_ascii_case(label))
    }
}

/// A purchasable item derived from an artwork's event config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Product {
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
    pub base_price: f64,
    pub available: bool,
    pub tag: String,
    pub sku_base: String,
    #[serde(default)]
    pub variants: Vec<VariantDimension>,
}

impl Product {
    pub fn has_variants(&self) -> bool {
        !self.variants.is_empty()
    }

    pub fn dimension(&self, name: &str) -> Option<&VariantDimension> {
        self.variants.iter().find(|d| d.name.eq_ignore_ascii_case(name))
    }

    /// The first option of every dimension that has one
    pub fn default_choices(&self) -> Vec<&VariantOption> {
        self.variants.iter().filter_map(|d| d.options.first()).collect()
    }

    pub fn display_tag(&self) -> &str {
        if self.tag.is_empty() {
            &self.kind
        } else {
            &self.tag
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_serializes_with_explicit_kind() {
        let json = serde_json::to_string(&PriceModifier::Multiplier(1.5)).unwrap();
        assert_eq!(json, r#"{"kind":"multiplier","value":1.5}"#);
        let back: PriceModifier = serde_json::from_str(r#"{"kind":"flat","value":80}"#).unwrap();
        assert_eq!(back, PriceModifier::Flat(80.0));
    }

    #[test]
    fn test_hint_only_for_flat_amounts() {
        assert_eq!(PriceModifier::Flat(80.0).hint("R"), Some("+R80".to_string()));
        assert_eq!(PriceModifier::Flat(0.0).hint("R"), None);
        assert_eq!(PriceModifier::Multiplier(2.0).hint("R"), None);
    }
}
