use dmg_common::Secret;
use log::*;

const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, Default)]
pub struct BackendConfig {
    /// Base URL of the inventory backend, e.g. "https://inventory.example.com". No trailing slash.
    pub base_url: String,
    /// Bearer token presented on every backend call.
    pub access_token: Secret<String>,
}

impl BackendConfig {
    pub fn new(base_url: &str, access_token: Secret<String>) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_string(), access_token }
    }

    pub fn from_env_or_default() -> Self {
        let base_url = std::env::var("DMG_BACKEND_URL").unwrap_or_else(|_| {
            warn!("🗄️ DMG_BACKEND_URL is not set. Using {DEFAULT_BACKEND_URL}, which is probably not what you want.");
            DEFAULT_BACKEND_URL.to_string()
        });
        let access_token = Secret::new(std::env::var("DMG_BACKEND_ACCESS_TOKEN").unwrap_or_else(|_| {
            warn!("🗄️ DMG_BACKEND_ACCESS_TOKEN is not set. Inventory calls will be rejected by the backend.");
            String::default()
        }));
        Self::new(&base_url, access_token)
    }
}
