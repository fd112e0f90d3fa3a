//! Shared plumbing for the external provider clients.
//!
//! Every provider (geocoding, solar potential, text generation) is reached
//! the same way: the local proxy first when one is configured, then the
//! provider directly with the server-side key.

use crate::config::Config;
use crate::errors::AppError;
use crate::geocoding::GeocodingClient;
use crate::llm::GeminiClient;
use crate::solar::SolarPotentialClient;
use axum::http::StatusCode;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Builds the HTTP client shared by all provider clients.
pub fn build_http_client(config: &Config) -> Result<Client, AppError> {
    Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()
        .map_err(|e| AppError::InternalError(format!("Failed to create HTTP client: {}", e)))
}

/// Reads a provider response, failing on non-2xx status or undecodable body.
pub async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    provider: &str,
) -> Result<T, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(AppError::ExternalApiError(format!(
            "{} returned {}: {}",
            provider, status, error_text
        )));
    }

    response.json::<T>().await.map_err(|e| {
        AppError::ExternalApiError(format!("Failed to parse {} response: {}", provider, e))
    })
}

/// Relays a provider response verbatim (status + JSON body) for the proxy endpoints.
pub async fn relay_json(
    response: reqwest::Response,
    provider: &str,
) -> Result<(StatusCode, Value), AppError> {
    let status = StatusCode::from_u16(response.status().as_u16())
        .map_err(|e| AppError::InternalError(format!("Invalid upstream status: {}", e)))?;
    let text = response.text().await.map_err(|e| {
        AppError::ExternalApiError(format!("Failed to read {} response: {}", provider, e))
    })?;
    // Non-JSON error pages are wrapped so the proxy always answers JSON
    let body = serde_json::from_str::<Value>(&text)
        .unwrap_or_else(|_| serde_json::json!({ "error": text }));
    Ok((status, body))
}

/// The three provider clients, built once from configuration and shared by
/// the report pipeline and the proxy endpoints.
#[derive(Clone)]
pub struct ProviderServices {
    pub geocoding: GeocodingClient,
    pub solar: SolarPotentialClient,
    pub gemini: GeminiClient,
}

impl ProviderServices {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = build_http_client(config)?;
        Ok(Self {
            geocoding: GeocodingClient::new(config, client.clone()),
            solar: SolarPotentialClient::new(config, client.clone()),
            gemini: GeminiClient::new(config, client),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_services_creation() {
        let services = ProviderServices::new(&Config::for_base_url("https://example.com"));
        assert!(services.is_ok());
    }
}
