use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::cart::{Cart, CartItem};
use crate::catalog::{quote, HydratedArtwork, HydratedEvent, Quote};
use crate::checkout;
use crate::models::{ImageSize, Metadata, Product, VariantOption};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("No listings found for this event")]
    NoListings,

    #[error("Unknown artwork: {0}")]
    UnknownArtwork(String),

    #[error("Artwork {artwork} has no product {product}")]
    UnknownProduct { artwork: String, product: String },

    #[error("No {dimension} option named {option}")]
    UnknownOption { dimension: String, option: String },

    #[error("Nothing is selected")]
    NothingSelected,

    #[error("{0} is not available")]
    Unavailable(String),

    #[error("Cart has no line {0}")]
    NoSuchLine(usize),
}

/// Change notifications for whoever renders the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    ArtworkSelected { id: String },
    ProductSelected { id: String, product: String },
    OptionChosen { dimension: String, option: String },
    PriceChanged { price: Option<i64> },
    CartChanged { lines: usize, total: i64 },
}

#[derive(Debug, Clone, Default)]
struct Selection {
    artwork: usize,
    product: Option<usize>,
    /// Chosen option index per variant dimension of the selected product
    choices: Vec<usize>,
}

pub struct Session {
    event: HydratedEvent,
    selection: Selection,
    cart: Cart,
    events: broadcast::Sender<SessionEvent>,
}

impl Session {
    /// Start a session on the first artwork of the library.
    pub fn new(event: HydratedEvent) -> Result<Self, SessionError> {
        if event.artworks.is_empty() {
            return Err(SessionError::NoListings);
        }
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let mut session = Self {
            event,
            selection: Selection::default(),
            cart: Cart::new(),
            events,
        };
        session.select_index(0);
        Ok(session)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn meta(&self) -> &Metadata {
        &self.event.meta
    }

    pub fn artworks(&self) -> &[HydratedArtwork] {
        &self.event.artworks
    }

    pub fn current_artwork(&self) -> &HydratedArtwork {
        &self.event.artworks[self.selection.artwork]
    }

    pub fn current_product(&self) -> Option<&Product> {
        self.selection
            .product
            .and_then(|i| self.current_artwork().products.get(i))
    }

    /// The chosen option of every dimension of the selected product.
    pub fn current_choices(&self) -> Vec<&VariantOption> {
        let Some(product) = self.current_product() else {
            return Vec::new();
        };
        product
            .variants
            .iter()
            .zip(&self.selection.choices)
            .filter_map(|(dim, &i)| dim.options.get(i))
            .collect()
    }

    pub fn current_quote(&self) -> Option<Quote> {
        let product = self.current_product()?;
        Some(quote(product, &self.current_choices()))
    }

    pub fn current_price(&self) -> Option<i64> {
        self.current_quote().map(|q| q.price)
    }

    pub fn select_artwork(&mut self, id: &str) -> Result<(), SessionError> {
        let index = self
            .event
            .artworks
            .iter()
            .position(|a| a.id() == id)
            .ok_or_else(|| SessionError::UnknownArtwork(id.to_string()))?;
        self.select_index(index);
        Ok(())
    }

    pub fn select_product(&mut self, label: &str) -> Result<(), SessionError> {
        let artwork = self.current_artwork();
        let index = artwork
            .products
            .iter()
            .position(|p| p.label.eq_ignore_ascii_case(label) || p.kind.eq_ignore_ascii_case(label))
            .ok_or_else(|| SessionError::UnknownProduct {
                artwork: artwork.id().to_string(),
                product: label.to_string(),
            })?;
        self.set_product(Some(index));
        Ok(())
    }

    pub fn choose_option(&mut self, dimension: &str, option: &str) -> Result<(), SessionError> {
        let product = self.current_product().ok_or(SessionError::NothingSelected)?;
        let unknown = || SessionError::UnknownOption {
            dimension: dimension.to_string(),
            option: option.to_string(),
        };
        let dim_index = product
            .variants
            .iter()
            .position(|d| d.name.eq_ignore_ascii_case(dimension))
            .ok_or_else(unknown)?;
        let opt_index = product.variants[dim_index]
            .options
            .iter()
            .position(|o| o.label.eq_ignore_ascii_case(option))
            .ok_or_else(unknown)?;

        let dim_name = product.variants[dim_index].name.clone();
        let opt_label = product.variants[dim_index].options[opt_index].label.clone();
        self.selection.choices[dim_index] = opt_index;

        self.notify(SessionEvent::OptionChosen {
            dimension: dim_name,
            option: opt_label,
        });
        self.notify_price();
        Ok(())
    }

    /// Freeze the current quote into a new cart line.
    pub fn add_to_cart(&mut self) -> Result<&CartItem, SessionError> {
        let product = self.current_product().ok_or(SessionError::NothingSelected)?;
        if !product.available {
            return Err(SessionError::Unavailable(product.label.clone()));
        }
        let quote = quote(product, &self.current_choices());
        let artwork = &self.event.artworks[self.selection.artwork].artwork;
        let title = artwork.display_title().to_string();
        let image = artwork.image_url(ImageSize::Thumbnail).to_string();

        info!(sku = %quote.sku, price = quote.price, "Added to cart");
        self.cart.push(&title, &image, quote);
        self.notify_cart();
        Ok(&self.cart.items()[self.cart.len() - 1])
    }

    pub fn remove_from_cart(&mut self, index: usize) -> Result<CartItem, SessionError> {
        let removed = self.cart.remove(index).ok_or(SessionError::NoSuchLine(index))?;
        self.notify_cart();
        Ok(removed)
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn cart_total(&self) -> i64 {
        self.cart.total()
    }

    /// WhatsApp link carrying the cart summary, `None` while the cart is empty.
    pub fn checkout_link(&self) -> Option<String> {
        checkout::cart_link(&self.cart, &self.event.meta)
    }

    fn select_index(&mut self, index: usize) {
        self.selection.artwork = index;
        let id = self.current_artwork().id().to_string();
        self.notify(SessionEvent::ArtworkSelected { id });
        let first = (!self.current_artwork().products.is_empty()).then_some(0);
        self.set_product(first);
    }

    fn set_product(&mut self, index: Option<usize>) {
        self.selection.product = index;
        self.selection.choices = self
            .current_product()
            .map(|p| vec![0; p.variants.len()])
            .unwrap_or_default();

        if let Some(product) = self.current_product() {
            let event = SessionEvent::ProductSelected {
                id: self.current_artwork().id().to_string(),
                product: product.label.clone(),
            };
            self.notify(event);
        }
        self.notify_price();
    }

    fn notify_price(&self) {
        self.notify(SessionEvent::PriceChanged {
            price: self.current_price(),
        });
    }

    fn notify_cart(&self) {
        self.notify(SessionEvent::CartChanged {
            lines: self.cart.len(),
            total: self.cart.total(),
        });
    }

    fn notify(&self, event: SessionEvent) {
        // No subscribers is fine; the session still works headless.
        if self.events.send(event).is_err() {
            debug!("No session subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::hydrate_event;
    use crate::models::{ArtCatalog, EventData, GlobalData};

    fn event() -> HydratedEvent {
        let global: GlobalData = serde_json::from_value(serde_json::json!({
            "business": {"currency": "R", "whatsapp_default": "27641417574"},
            "defaults": {"blueprints": {
                "print_sizes": {
                    "A4": {"label": "A4", "base": 50, "code": "A4"},
                    "A3": {"label": "A3", "base": 80, "code": "A3"}
                },
                "print_papers": {
                    "matte": {"label": "Matte", "tier": 1, "code": "MT"},
                    "satin": {"label": "Satin", "tier": 3, "code": "ST"}
                },
                "loot": {"sticker": {"label": "Sticker", "price": 40}}
            }}
        }))
        .unwrap();
        let catalog: ArtCatalog = serde_json::from_value(serde_json::json!({
            "artworks": [
                {"id": "PDD-001", "title": "Red Balloon", "images": {"thumbnail": "t1.webp"}},
                {"id": "PDD-002", "title": "Night Swim"}
            ]
        }))
        .unwrap();
        let event: EventData = serde_json::from_value(serde_json::json!({
            "meta": {"event_name": "CCC Town 26"},
            "inventory": [
                {"id": "PDD-001", "config": {"prints": ["A4", "A3"], "sticker": true}},
                {"id": "PDD-002", "config": {"sticker": {"available": false, "tag": "SOLD OUT"}}}
            ]
        }))
        .unwrap();
        hydrate_event(&global, &catalog, &event)
    }

    #[test]
    fn test_new_selects_first_artwork_and_product() {
        let session = Session::new(event()).unwrap();
        assert_eq!(session.current_artwork().id(), "PDD-001");
        assert_eq!(session.current_product().unwrap().kind, "Print");
        // A4 + Matte
        assert_eq!(session.current_price(), Some(50));
    }

    #[test]
    fn test_empty_library_is_no_listings() {
        let mut empty = event();
        empty.artworks.clear();
        assert_eq!(Session::new(empty).err(), Some(SessionError::NoListings));
    }

    #[test]
    fn test_two_configurations_make_two_lines() {
        let mut session = Session::new(event()).unwrap();
        session.add_to_cart().unwrap();

        session.choose_option("Size", "A3").unwrap();
        session.choose_option("Paper", "Satin").unwrap();
        assert_eq!(session.current_price(), Some(240));
        let line = session.add_to_cart().unwrap();
        assert_eq!(line.details, "A3 · Satin");
        assert_eq!(line.sku, "PRT-PDD-001-A3-ST");
        assert_eq!(line.image, "t1.webp");

        assert_eq!(session.cart().len(), 2);
        assert_eq!(session.cart_total(), 290);

        session.remove_from_cart(0).unwrap();
        assert_eq!(session.cart().len(), 1);
        assert_eq!(session.cart().items()[0].price, 240);
        assert_eq!(session.cart_total(), 240);
    }

    #[test]
    fn test_price_is_frozen_at_add_time() {
        let mut session = Session::new(event()).unwrap();
        session.add_to_cart().unwrap();
        session.choose_option("Size", "A3").unwrap();
        assert_eq!(session.cart().items()[0].price, 50);
    }

    #[test]
    fn test_selecting_product_resets_choices() {
        let mut session = Session::new(event()).unwrap();
        session.choose_option("Size", "A3").unwrap();
        session.select_product("Sticker").unwrap();
        assert_eq!(session.current_price(), Some(40));
        assert!(session.current_choices().is_empty());

        session.select_product("Print").unwrap();
        let labels: Vec<_> = session.current_choices().iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["A4", "Matte"]);
    }

    #[test]
    fn test_unavailable_product_is_refused() {
        let mut session = Session::new(event()).unwrap();
        session.select_artwork("PDD-002").unwrap();
        assert!(matches!(
            session.add_to_cart(),
            Err(SessionError::Unavailable(_))
        ));
        assert!(session.cart().is_empty());
    }

    #[test]
    fn test_unknown_lookups() {
        let mut session = Session::new(event()).unwrap();
        assert!(matches!(
            session.select_artwork("PDD-999"),
            Err(SessionError::UnknownArtwork(_))
        ));
        assert!(matches!(
            session.choose_option("Size", "A0"),
            Err(SessionError::UnknownOption { .. })
        ));
        assert_eq!(session.remove_from_cart(3).err(), Some(SessionError::NoSuchLine(3)));
    }

    #[test]
    fn test_changes_are_broadcast() {
        let mut session = Session::new(event()).unwrap();
        let mut rx = session.subscribe();

        session.choose_option("Paper", "Satin").unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::OptionChosen {
                dimension: "Paper".to_string(),
                option: "Satin".to_string()
            }
        );
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::PriceChanged { price: Some(150) });

        session.add_to_cart().unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::CartChanged { lines: 1, total: 150 }
        );
    }

    #[test]
    fn test_checkout_link_only_with_items() {
        let mut session = Session::new(event()).unwrap();
        assert!(session.checkout_link().is_none());
        session.add_to_cart().unwrap();
        let link = session.checkout_link().unwrap();
        assert!(link.starts_with("https://wa.me/27641417574?text="));
    }
}
