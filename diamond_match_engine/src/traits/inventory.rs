use thiserror::Error;

use crate::db_types::InventoryItem;

#[derive(Debug, Clone, Error)]
pub enum InventoryFetchError {
    #[error("Inventory backend call failed. {0}")]
    RequestFailed(String),
    #[error("Inventory backend returned an unusable response. {0}")]
    InvalidResponse(String),
}

/// A source of per-dealer inventory snapshots.
///
/// The matcher holds the backend at arm's length through this trait so tests can substitute an
/// in-memory stub, and so a fetch timeout can one day be added in the implementation without
/// touching the scan loop.
#[allow(async_fn_in_trait)]
pub trait InventoryFetcher {
    /// Fetch the dealer's current inventory. A failure here applies to that dealer only; the
    /// caller is expected to log it and carry on with the remaining dealers.
    async fn fetch_inventory(&self, dealer_telegram_id: i64) -> Result<Vec<InventoryItem>, InventoryFetchError>;
}

#[derive(Debug, Clone, Error)]
#[error("Could not generate a diamond post. {0}")]
pub struct PostComposerError(pub String);

/// Collaborator behind the payment-confirmation branch of the webhook. What the generated post
/// contains and where it gets published is entirely the implementation's business.
#[allow(async_fn_in_trait)]
pub trait PostComposer {
    async fn generate_diamond_post(&self, dealer_telegram_id: i64) -> Result<(), PostComposerError>;
}
