//! Data models for the gallery's JSON files and derived entities.
//!
//! - `Artwork`, `ArtCatalog`: the master catalog
//! - `GlobalData`, `Blueprints`, `Metadata`: global pricing rules
//! - `EventData`, `ListingConfig`: per-event inventory and overrides
//! - `Product`, `VariantDimension`, `PriceModifier`: derived purchasables
//! - `EventListing`: the events index
//! - `StoreInventory`: gallery stock status

pub mod artwork;
pub mod blueprint;
pub mod event;
pub mod lenient;
pub mod listing;
pub mod product;
pub mod store;

pub use artwork::{ArtCatalog, Artwork, ImageSet, ImageSize, Orientation, FALLBACK_IMAGE};
pub use blueprint::{Blueprints, GlobalData, LootBlueprint, Metadata, PaperTier, PrintSize};
pub use event::{EventData, InventoryListing, ListingConfig, LootConfig, LootOverride, OriginalConfig, PrintChoice, Theme};
pub use lenient::{parse_each, skip_malformed};
pub use listing::{live_count, sort_events, EventListing, EventStatus};
pub use product::{PriceModifier, Product, VariantDimension, VariantOption};
pub use store::{StockStatus, StoreInventory, StoreListing};
