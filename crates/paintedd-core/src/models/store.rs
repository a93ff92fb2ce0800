use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::lenient::skip_malformed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    Available,
    Sold,
    #[serde(other)]
    Unlisted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreListing {
    pub art_id: String,
    pub status: StockStatus,
}

/// The gallery store file. Missing entirely is normal; the gallery then
/// treats every artwork as unlisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreInventory {
    #[serde(default, deserialize_with = "skip_malformed")]
    pub inventory: Vec<StoreListing>,
}

impl StoreInventory {
    pub fn by_art_id(&self) -> HashMap<&str, StockStatus> {
        self.inventory
            .iter()
            .map(|l| (l.art_id.as_str(), l.status))
            .collect()
    }

    pub fn status_of(&self, art_id: &str) -> StockStatus {
        self.inventory
            .iter()
            .rev()
            .find(|l| l.art_id == art_id)
            .map(|l| l.status)
            .unwrap_or(StockStatus::Unlisted)
    }
}
