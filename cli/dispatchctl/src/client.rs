//! HTTP client for the dispatch API.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tabled::Tabled;

use crate::error::CliError;

/// Request to create a new order. Durations are in seconds.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub name: String,
    pub temp: String,
    pub shelf_life: f64,
    pub decay_rate: f64,
}

/// Response for a created order.
#[derive(Debug, Deserialize)]
pub struct CreateOrderResponse {
    #[serde(rename = "orderID")]
    pub order_id: String,
}

/// Request to advance an order's state.
#[derive(Debug, Serialize)]
struct UpdateOrderRequest<'a> {
    state: &'a str,
}

/// Rendered order as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, Tabled)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    #[serde(rename = "orderID")]
    #[tabled(rename = "ID")]
    pub order_id: String,
    #[tabled(rename = "NAME")]
    pub name: String,
    #[tabled(rename = "STATE")]
    pub state: String,
    #[tabled(rename = "SHELF")]
    pub shelf: String,
    #[tabled(rename = "SHELF LIFE (S)")]
    pub shelf_life: f64,
    #[tabled(rename = "VALUE (S)")]
    pub value: f64,
    #[tabled(rename = "NORMAL")]
    pub normal: f64,
    #[tabled(rename = "DECAY (S)")]
    pub decay: f64,
    #[tabled(rename = "AGE (S)")]
    pub age: f64,
}

/// Response for listing orders.
#[derive(Debug, Deserialize)]
pub struct ListOrdersResponse {
    pub orders: Vec<OrderResponse>,
}

/// API client for communicating with the dispatch service.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client for the given base URL.
    pub fn new(base_url: &str) -> Result<Self, CliError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build a URL for an endpoint.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Whether the API answers its health probe.
    pub async fn healthy(&self) -> bool {
        match self.client.get(self.url("/healthz")).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Submit a new order.
    pub async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<CreateOrderResponse, CliError> {
        let response = self
            .client
            .post(self.url("/order"))
            .json(request)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Fetch a single order.
    pub async fn get_order(&self, id: &str) -> Result<OrderResponse, CliError> {
        let response = self
            .client
            .get(self.url(&format!("/order/{id}")))
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// List every shelved order.
    pub async fn list_orders(&self) -> Result<ListOrdersResponse, CliError> {
        let response = self.client.get(self.url("/order")).send().await?;
        Self::handle_response(response).await
    }

    /// Advance an order to the given state.
    pub async fn update_order(&self, id: &str, state: &str) -> Result<OrderResponse, CliError> {
        let response = self
            .client
            .post(self.url(&format!("/order/{id}")))
            .json(&UpdateOrderRequest { state })
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, CliError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body: serde_json::Value = response.json().await.unwrap_or_default();
        let message = body
            .get("error")
            .and_then(|value| value.as_str())
            .unwrap_or("unknown error")
            .to_string();

        if status == reqwest::StatusCode::NOT_FOUND {
            Err(CliError::NotFound(message))
        } else {
            Err(CliError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}
