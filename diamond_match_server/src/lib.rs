//! # Diamond Match Gateway server
//! This crate hosts the HTTP layer of the gateway. It is responsible for:
//! Listening for incoming webhook calls from Telegram.
//! Verifying that each call genuinely originates from the platform.
//! Parsing the update envelope and routing it through the matching pipeline in
//! `diamond_match_engine`.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more
//! information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/webhook/telegram`: The webhook route for receiving update envelopes from Telegram.
pub mod cli;
pub mod config;
pub mod errors;

pub mod helpers;
pub mod integrations;
pub mod routes;
pub mod server;
pub mod verify;

pub mod telegram_types;

#[cfg(test)]
mod endpoint_tests;
