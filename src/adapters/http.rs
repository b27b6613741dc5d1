use crate::core::{ConfigProvider, GeocodingProvider, LookupOutcome};
use crate::domain::model::{AddressComponent, GeocodeResult};
use crate::utils::error::Result;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Google Geocoding API client. Only the first candidate of a response is used.
pub struct GoogleGeocoder {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GoogleGeocoder {
    pub fn new(endpoint: String, api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::new(
            config.endpoint().to_string(),
            config.api_key().to_string(),
            Duration::from_secs(config.timeout_seconds()),
        )
    }
}

#[async_trait::async_trait]
impl GeocodingProvider for GoogleGeocoder {
    async fn lookup(&self, query: &str) -> LookupOutcome {
        let request = self
            .client
            .get(&self.endpoint)
            .query(&[("address", query), ("key", self.api_key.as_str())]);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                // the request URL carries the API key
                tracing::warn!("Geocoding request failed: {}", e.without_url());
                return LookupOutcome::NotFound;
            }
        };

        tracing::debug!("Geocoding response status: {}", response.status());
        if response.status() != StatusCode::OK {
            return LookupOutcome::NotFound;
        }

        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Geocoding response was not JSON: {}", e.without_url());
                return LookupOutcome::NotFound;
            }
        };

        interpret_response(&body)
    }
}

/// Maps a decoded response body onto a lookup outcome.
pub fn interpret_response(body: &Value) -> LookupOutcome {
    let status = body.get("status").and_then(Value::as_str).unwrap_or("");
    match status {
        "OVER_QUERY_LIMIT" => LookupOutcome::RateLimited,
        "OK" => body
            .get("results")
            .and_then(Value::as_array)
            .and_then(|results| results.first())
            .map(|first| LookupOutcome::Found(candidate_from_json(first)))
            .unwrap_or(LookupOutcome::NotFound),
        other => {
            if let Some(message) = body.get("error_message").and_then(Value::as_str) {
                tracing::warn!("Geocoding status {}: {}", other, message);
            } else {
                tracing::debug!("Geocoding status {}", other);
            }
            LookupOutcome::NotFound
        }
    }
}

/// Entries that do not decode become empty components, so only the fields they
/// would have filled are affected.
fn candidate_from_json(value: &Value) -> GeocodeResult {
    let formatted_address = value
        .get("formatted_address")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let address_components = value
        .get("address_components")
        .and_then(Value::as_array)
        .map(|components| {
            components
                .iter()
                .map(|c| serde_json::from_value::<AddressComponent>(c.clone()).unwrap_or_default())
                .collect()
        })
        .unwrap_or_default();

    GeocodeResult {
        formatted_address,
        address_components,
    }
}
