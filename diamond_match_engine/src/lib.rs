//! Diamond Match Engine
//!
//! The engine holds every piece of the gateway that does not depend on the HTTP layer:
//!
//! 1. The diamond-request extractor ([`mod@helpers`]), which turns free-text group chat messages
//!    into structured [`db_types::DiamondRequest`]s with an additive confidence score.
//! 2. The match flow API ([`MatchFlowApi`]), which scans dealer inventories against an extracted
//!    request and persists one notification per matching dealer. Storage and the inventory
//!    backend are abstracted behind the traits in [`mod@traits`]; SQLite is the provided store.
//! 3. A small event hook system ([`mod@events`]) so a downstream delivery worker can subscribe to
//!    dispatched notifications without the engine knowing anything about Telegram's send API.
mod db;

pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;

mod dme_api;

#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
pub use dme_api::{
    matcher::{matching_items, scan_dealer_inventories, score_item, MATCH_SCORE_THRESHOLD, MAX_MATCHED_ITEMS},
    MatchFlowApi,
    MatchFlowError,
};
