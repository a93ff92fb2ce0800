use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Quote;

/// A cart line. Price and details are frozen when the line is added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct CartItem {
    pub id: u64,
    pub title: String,
    pub image: String,
    pub details: String,
    pub price: i64,
    pub sku: String,
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct Cart {
    items: Vec<CartItem>,
    next_id: u64,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, title: &str, image: &str, quote: Quote) -> &CartItem {
        self.next_id += 1;
        self.items.push(CartItem {
            id: self.next_id,
            title: title.to_string(),
            image: image.to_string(),
            details: quote.details,
            price: quote.price,
            sku: quote.sku,
            added_at: Utc::now(),
        });
        &self.items[self.items.len() - 1]
    }

    pub fn remove(&mut self, index: usize) -> Option<CartItem> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total(&self) -> i64 {
        self.items.iter().map(|i| i.price).sum()
    }
}
