//! Client for the external dealer-inventory backend.
//!
//! Dealers manage their stones through a separate FastAPI service; this crate wraps the handful of
//! endpoints the gateway consumes. Responses from the backend are loosely shaped (a bare JSON
//! array, or an object wrapping an array under one of several keys), so all decoding goes through
//! a single normalization function that fails closed to an empty inventory.
mod api;
mod config;
mod data_objects;
mod error;

pub use api::InventoryApi;
pub use config::BackendConfig;
pub use data_objects::{normalize_stone_payload, Stone};
pub use error::InventoryApiError;
