use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    Method,
};
use serde_json::Value;

use crate::{config::BackendConfig, data_objects::normalize_stone_payload, InventoryApiError, Stone};

#[derive(Clone)]
pub struct InventoryApi {
    config: BackendConfig,
    client: Arc<Client>,
}

impl InventoryApi {
    pub fn new(config: BackendConfig) -> Result<Self, InventoryApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let bearer = format!("Bearer {}", config.access_token.reveal());
        let val = HeaderValue::from_str(&bearer).map_err(|e| InventoryApiError::Initialization(e.to_string()))?;
        headers.insert(AUTHORIZATION, val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client =
            Client::builder().default_headers(headers).build().map_err(|e| InventoryApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.config.base_url)
    }

    async fn rest_query(&self, method: Method, path: &str, params: &[(&str, String)], body: Option<Value>) -> Result<Value, InventoryApiError> {
        let url = self.url(path);
        trace!("🗄️ Sending backend query: {url}");
        let mut req = self.client.request(method, url);
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| InventoryApiError::RequestError(e.to_string()))?;
        if response.status().is_success() {
            trace!("🗄️ Backend query successful. {}", response.status());
            response.json::<Value>().await.map_err(|e| InventoryApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| InventoryApiError::RequestError(e.to_string()))?;
            Err(InventoryApiError::QueryError { status, message })
        }
    }

    /// Fetches the full inventory snapshot for one dealer.
    ///
    /// The backend's response shape varies by version, so the raw JSON is passed through
    /// [`normalize_stone_payload`] before being returned.
    pub async fn get_all_stones(&self, user_id: i64) -> Result<Vec<Stone>, InventoryApiError> {
        debug!("🗄️ Fetching inventory for dealer {user_id}");
        let payload = self.rest_query(Method::GET, "/get_all_stones", &[("user_id", user_id.to_string())], None).await?;
        let stones = normalize_stone_payload(payload);
        debug!("🗄️ Dealer {user_id} has {} stones on the books", stones.len());
        Ok(stones)
    }

    /// Asks the backend to compose and publish a storefront post for the dealer's latest stone.
    /// Fired from the payment-confirmation branch of the webhook; the post content is entirely the
    /// backend's business.
    pub async fn generate_diamond_post(&self, user_id: i64) -> Result<(), InventoryApiError> {
        debug!("🗄️ Requesting diamond post generation for dealer {user_id}");
        let body = serde_json::json!({ "user_id": user_id });
        self.rest_query(Method::POST, "/generate_diamond_post", &[], Some(body)).await?;
        info!("🗄️ Diamond post generation triggered for dealer {user_id}");
        Ok(())
    }
}
