//! Adapts the inventory backend client to the engine's collaborator traits, and converts the
//! backend's loosely-typed stone rows into the engine's typed inventory items.
use diamond_match_engine::{
    db_types::InventoryItem,
    traits::{InventoryFetchError, InventoryFetcher, PostComposer, PostComposerError},
};
use inventory_tools::{InventoryApi, InventoryApiError, Stone};
use log::*;

#[derive(Clone)]
pub struct BackendCollaborators {
    api: InventoryApi,
}

impl BackendCollaborators {
    pub fn new(api: InventoryApi) -> Self {
        Self { api }
    }
}

impl InventoryFetcher for BackendCollaborators {
    async fn fetch_inventory(&self, dealer_telegram_id: i64) -> Result<Vec<InventoryItem>, InventoryFetchError> {
        let stones = self.api.get_all_stones(dealer_telegram_id).await.map_err(|e| match e {
            InventoryApiError::JsonError(msg) => InventoryFetchError::InvalidResponse(msg),
            other => InventoryFetchError::RequestFailed(other.to_string()),
        })?;
        let total = stones.len();
        let items: Vec<InventoryItem> = stones.into_iter().filter_map(inventory_item_from_stone).collect();
        if items.len() < total {
            debug!("🗄️ Dealer {dealer_telegram_id}: dropped {} unusable inventory rows", total - items.len());
        }
        Ok(items)
    }
}

impl PostComposer for BackendCollaborators {
    async fn generate_diamond_post(&self, dealer_telegram_id: i64) -> Result<(), PostComposerError> {
        self.api.generate_diamond_post(dealer_telegram_id).await.map_err(|e| PostComposerError(e.to_string()))
    }
}

/// A stone without a positive weight or price cannot be scored or priced, so it is dropped here
/// rather than carried through the matcher as zeroes. Grade strings we do not recognize degrade
/// to `None` and simply never contribute to a match score.
pub fn inventory_item_from_stone(stone: Stone) -> Option<InventoryItem> {
    let weight = stone.weight.filter(|w| *w > 0.0)?;
    let price_per_carat = stone.price_per_carat.filter(|p| *p > 0.0)?;
    Some(InventoryItem {
        stock_number: stone.stock_number,
        shape: stone.shape.as_deref().and_then(|s| s.parse().ok()),
        weight,
        color: stone.color.as_deref().and_then(|s| s.parse().ok()),
        clarity: stone.clarity.as_deref().and_then(|s| s.parse().ok()),
        price_per_carat,
    })
}
