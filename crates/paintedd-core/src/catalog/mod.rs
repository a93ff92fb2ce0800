//! Catalog hydration: global blueprints + master catalog + event inventory.
//!
//! The hydrator deep-copies the global blueprints, applies the event's
//! pricing overrides to them, then walks the event inventory and derives
//! the purchasable products of every artwork it can find in the master
//! catalog. Lookup misses are logged and skipped, never fatal.

pub mod hydrator;
pub mod pricing;

use serde::Serialize;

pub use hydrator::{CatalogHydrator, HydratedArtwork, Hydration};
pub use pricing::{compute_price, quote, PriceBreakdown, Quote};

use crate::models::{ArtCatalog, EventData, GlobalData, Metadata, Theme};

/// Everything an event page needs once its three data files are loaded.
#[derive(Debug, Clone, Serialize)]
pub struct HydratedEvent {
    pub meta: Metadata,
    pub theme: Option<Theme>,
    pub artworks: Vec<HydratedArtwork>,
    pub missing: Vec<String>,
}

impl HydratedEvent {
    pub fn artwork(&self, id: &str) -> Option<&HydratedArtwork> {
        self.artworks.iter().find(|a| a.id() == id)
    }
}

pub fn hydrate_event(global: &GlobalData, catalog: &ArtCatalog, event: &EventData) -> HydratedEvent {
    let mut meta = Metadata::default();
    meta.merge(&global.business);
    meta.merge(&event.meta);

    let hydrator = CatalogHydrator::new(&global.defaults.blueprints, &event.pricing_overrides);
    let Hydration { artworks, missing } = hydrator.hydrate(catalog, &event.inventory);

    HydratedEvent {
        meta,
        theme: event.theme.clone(),
        artworks,
        missing,
    }
}
