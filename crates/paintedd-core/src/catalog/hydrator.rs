use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::models::{
    ArtCatalog, Artwork, Blueprints, InventoryListing, ListingConfig, PriceModifier, PrintChoice,
    Product, VariantDimension, VariantOption,
};

/// Flat amounts at or below this, or multipliers above it, were read the
/// other way by the old magnitude convention. Still valid, but worth a warning.
const LEGACY_MULTIPLIER_CEILING: f64 = 10.0;

/// An artwork from the master catalog with its event config and products.
#[derive(Debug, Clone, Serialize)]
pub struct HydratedArtwork {
    #[serde(flatten)]
    pub artwork: Artwork,
    pub config: Option<ListingConfig>,
    pub products: Vec<Product>,
}

impl HydratedArtwork {
    pub fn id(&self) -> &str {
        &self.artwork.id
    }

    /// Artworks without products are display only
    pub fn is_for_sale(&self) -> bool {
        !self.products.is_empty()
    }

    pub fn product(&self, label: &str) -> Option<&Product> {
        self.products
            .iter()
            .find(|p| p.kind.eq_ignore_ascii_case(label) || p.label.eq_ignore_ascii_case(label))
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Hydration {
    pub artworks: Vec<HydratedArtwork>,
    /// Inventory ids with no master record
    pub missing: Vec<String>,
}

/// Turns per-artwork event config into products, using blueprints that
/// already carry the event's pricing overrides.
#[derive(Debug, Clone)]
pub struct CatalogHydrator {
    blueprints: Blueprints,
}

impl CatalogHydrator {
    /// `None` overrides (written as `null`) leave the blueprint price alone.
    pub fn new(blueprints: &Blueprints, pricing_overrides: &BTreeMap<String, Option<f64>>) -> Self {
        let mut blueprints = blueprints.clone();
        for (kind, price) in pricing_overrides {
            let Some(price) = price else {
                continue;
            };
            match blueprints.loot.get_mut(kind) {
                Some(loot) => {
                    debug!(kind = %kind, from = loot.price, to = price, "Applying event price override");
                    loot.price = *price;
                }
                None => warn!(kind = %kind, "Pricing override for unknown loot type"),
            }
        }
        warn_on_ambiguous_pricing(&blueprints);
        Self { blueprints }
    }

    pub fn blueprints(&self) -> &Blueprints {
        &self.blueprints
    }

    /// Match inventory entries to master records and derive their products.
    /// Entries with no master record are skipped and reported.
    pub fn hydrate(&self, catalog: &ArtCatalog, inventory: &[InventoryListing]) -> Hydration {
        let index = catalog.index();
        let mut hydration = Hydration::default();

        for listing in inventory {
            let Some(master) = index.get(listing.id.as_str()) else {
                warn!(id = %listing.id, "Missing master record for inventory listing");
                hydration.missing.push(listing.id.clone());
                continue;
            };

            let products = listing
                .config
                .as_ref()
                .map(|cfg| self.products_for(&master.id, cfg))
                .unwrap_or_default();

            hydration.artworks.push(HydratedArtwork {
                artwork: (*master).clone(),
                config: listing.config.clone(),
                products,
            });
        }

        debug!(
            hydrated = hydration.artworks.len(),
            missing = hydration.missing.len(),
            "Hydrated event inventory"
        );
        hydration
    }

    /// Products in display order: original, print, then loot.
    pub fn products_for(&self, art_id: &str, cfg: &ListingConfig) -> Vec<Product> {
        let mut products = Vec::new();

        let original = cfg.original.as_ref().filter(|o| o.is_available());
        if let Some(original) = original.filter(|o| o.price.is_none()) {
            warn!(art = %art_id, available = ?original.available, "Original has no price; not offered");
        }
        if let Some(price) = original.and_then(|o| o.price) {
            products.push(Product {
                kind: "Original".to_string(),
                label: "Original Artwork".to_string(),
                base_price: price,
                available: true,
                tag: "1 of 1".to_string(),
                sku_base: format!("ORG-{}", art_id),
                variants: vec![],
            });
        }

        if let Some(print) = self.print_product(art_id, &cfg.prints) {
            products.push(print);
        }

        for (kind, loot_cfg) in cfg.loot() {
            let Some(loot_cfg) = loot_cfg.filter(|c| c.is_offered()) else {
                continue;
            };
            let Some(bp) = self.blueprints.loot(kind) else {
                warn!(art = %art_id, kind = kind, "No blueprint for configured loot item");
                continue;
            };
            let overrides = loot_cfg.overrides();
            products.push(Product {
                kind: bp.label.clone(),
                label: bp.label.clone(),
                base_price: overrides.price_override.unwrap_or(bp.price),
                available: overrides.available != Some(false),
                tag: overrides.tag.unwrap_or_else(|| kind.to_uppercase()),
                sku_base: format!("{}-{}", sku_prefix(kind), art_id),
                variants: vec![],
            });
        }

        products
    }

    fn print_product(&self, art_id: &str, prints: &[PrintChoice]) -> Option<Product> {
        let sizes: Vec<VariantOption> = prints
            .iter()
            .filter_map(|choice| self.size_option(choice))
            .collect();

        if sizes.is_empty() {
            if !prints.is_empty() {
                debug!(art = %art_id, "No configured print size resolved; print not offered");
            }
            return None;
        }

        Some(Product {
            kind: "Print".to_string(),
            label: "Fine Art Print".to_string(),
            // Size determines the starting price
            base_price: 0.0,
            available: true,
            tag: "Archival".to_string(),
            sku_base: format!("PRT-{}", art_id),
            variants: vec![
                VariantDimension {
                    name: "Size".to_string(),
                    options: sizes,
                },
                VariantDimension {
                    name: "Paper".to_string(),
                    options: self.paper_options(),
                },
            ],
        })
    }

    fn size_option(&self, choice: &PrintChoice) -> Option<VariantOption> {
        match choice {
            PrintChoice::Code(code) => self.blueprints.print_size(code).map(|bp| VariantOption {
                label: bp.label.clone(),
                modifier: PriceModifier::Flat(bp.base),
                code: Some(bp.code.clone()),
            }),
            PrintChoice::Custom {
                size,
                label,
                price_override,
            } => {
                let Some(code) = size.as_ref().or(label.as_ref()) else {
                    warn!("Inline print size has neither size nor label; skipped");
                    return None;
                };
                Some(VariantOption {
                    label: label.clone().unwrap_or_else(|| code.clone()),
                    modifier: PriceModifier::Flat(price_override.unwrap_or(0.0)),
                    code: Some(code.clone()),
                })
            }
        }
    }

    fn paper_options(&self) -> Vec<VariantOption> {
        self.blueprints
            .print_papers
            .values()
            .map(|paper| VariantOption {
                label: paper.label.clone(),
                modifier: PriceModifier::Multiplier(paper.tier),
                code: paper.code.clone(),
            })
            .collect()
    }
}

/// `sticker` -> `STI`
fn sku_prefix(kind: &str) -> String {
    kind.chars().take(3).collect::<String>().to_uppercase()
}

fn warn_on_ambiguous_pricing(blueprints: &Blueprints) {
    for (code, size) in &blueprints.print_sizes {
        if size.base > 0.0 && size.base <= LEGACY_MULTIPLIER_CEILING {
            warn!(size = %code, base = size.base, "Print size base is small enough to read as a multiplier; treating as flat");
        }
    }
    for (key, paper) in &blueprints.print_papers {
        if paper.tier <= 0.0 || paper.tier > LEGACY_MULTIPLIER_CEILING {
            warn!(paper = %key, tier = paper.tier, "Paper tier outside the usual multiplier range; treating as multiplier");
        }
    }
}
