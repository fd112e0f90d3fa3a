use crate::circuit_breaker::{call_guarded, create_proxy_circuit_breaker, ProxyCircuitBreaker};
use crate::config::Config;
use crate::errors::AppError;
use crate::models::{AddressResolution, Coordinates};
use crate::services::{read_json, relay_json};
use axum::http::StatusCode;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Display marker appended to synthesized addresses.
pub const SYNTHETIC_MARKER: &str = "(Simulado)";

/// Anchor for synthetic coordinates: Praça da Sé, São Paulo.
pub const BASE_COORDINATES: Coordinates = Coordinates {
    latitude: -23.5505,
    longitude: -46.6333,
};

// ============ Provider schema ============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub formatted_address: String,
    pub geometry: GeocodeGeometry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeGeometry {
    pub location: GeocodeLocation,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeocodeLocation {
    pub lat: f64,
    pub lng: f64,
}

impl GeocodeResponse {
    /// Accepts only an explicit `OK` from the provider with at least one candidate.
    fn into_resolution(self) -> Result<AddressResolution, AppError> {
        if self.status != "OK" {
            return Err(AppError::ExternalApiError(format!(
                "Geocoding status {}: {}",
                self.status,
                self.error_message.unwrap_or_default()
            )));
        }

        let first = self.results.into_iter().next().ok_or_else(|| {
            AppError::ExternalApiError("Geocoding returned OK without results".to_string())
        })?;

        Ok(AddressResolution::Resolved {
            coordinates: Coordinates {
                latitude: first.geometry.location.lat,
                longitude: first.geometry.location.lng,
            },
            formatted_address: first.formatted_address,
        })
    }
}

// ============ Client ============

/// Resolves free-text addresses to coordinates.
#[derive(Clone)]
pub struct GeocodingClient {
    client: Client,
    proxy_base_url: Option<String>,
    base_url: String,
    api_key: String,
    proxy_breaker: ProxyCircuitBreaker,
}

impl GeocodingClient {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            proxy_base_url: config.proxy_base_url.clone(),
            base_url: config.geocoding_base_url.clone(),
            api_key: config.google_maps_api_key.clone(),
            proxy_breaker: create_proxy_circuit_breaker(),
        }
    }

    /// Resolves an address, degrading through proxy → provider → synthetic.
    ///
    /// Never fails: when both remote tiers fail the result is a
    /// [`AddressResolution::Synthetic`] derived from the address text.
    pub async fn resolve_address(&self, address: &str) -> AddressResolution {
        if let Some(ref proxy) = self.proxy_base_url {
            // Provider statuses are judged outside the breaker
            let answer = call_guarded(&self.proxy_breaker, self.geocode_via_proxy(proxy, address))
                .await
                .and_then(GeocodeResponse::into_resolution);
            match answer {
                Ok(resolution) => {
                    tracing::info!("✓ Address resolved via proxy: {}", address);
                    return resolution;
                }
                Err(e) => tracing::warn!("Geocoding proxy failed, trying provider: {}", e),
            }
        }

        match self.geocode_direct(address).await {
            Ok(resolution) => {
                tracing::info!("✓ Address resolved via provider: {}", address);
                resolution
            }
            Err(e) => {
                tracing::warn!(
                    "Geocoding provider failed, using synthetic coordinates: {}",
                    e
                );
                synthetic_resolution(address)
            }
        }
    }

    async fn geocode_via_proxy(
        &self,
        proxy: &str,
        address: &str,
    ) -> Result<GeocodeResponse, AppError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/api/geocode", proxy),
            &[("address", address)],
        )
        .map_err(|e| AppError::ExternalApiError(format!("Failed to build URL: {}", e)))?;

        let response = self.client.get(url).send().await.map_err(|e| {
            AppError::ExternalApiError(format!("Geocoding proxy request failed: {}", e))
        })?;

        read_json(response, "Geocoding proxy").await
    }

    async fn geocode_direct(&self, address: &str) -> Result<AddressResolution, AppError> {
        let response = self.send_upstream(address).await?;
        read_json::<GeocodeResponse>(response, "Geocoding")
            .await?
            .into_resolution()
    }

    /// Raw upstream call used by the proxy endpoint.
    pub async fn fetch_upstream(&self, address: &str) -> Result<(StatusCode, Value), AppError> {
        let response = self.send_upstream(address).await?;
        relay_json(response, "Geocoding").await
    }

    async fn send_upstream(&self, address: &str) -> Result<reqwest::Response, AppError> {
        // Build URL with proper parameter encoding
        let url = reqwest::Url::parse_with_params(
            &format!("{}/maps/api/geocode/json", self.base_url),
            &[
                ("address", address),
                ("region", "br"),
                ("key", self.api_key.as_str()),
            ],
        )
        .map_err(|e| AppError::ExternalApiError(format!("Failed to build URL: {}", e)))?;

        // Redact key from logs
        tracing::debug!(
            "Geocoding URL: {}/maps/api/geocode/json?address={}&key=[REDACTED]",
            self.base_url,
            address
        );

        self.client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Geocoding request failed: {}", e)))
    }
}

// ============ Synthetic fallback ============

/// Sum of the address's character codes. Cheap and stable, not cryptographic.
pub fn address_hash(address: &str) -> u32 {
    address
        .chars()
        .fold(0u32, |acc, c| acc.wrapping_add(c as u32))
}

/// Deterministic coordinates near [`BASE_COORDINATES`], within ±0.05° on each axis.
pub fn synthetic_coordinates(address: &str) -> Coordinates {
    let hash = address_hash(address);
    let lat_offset = ((hash % 100) as f64 - 50.0) / 1000.0;
    let lng_offset = (((hash / 100) % 100) as f64 - 50.0) / 1000.0;

    Coordinates {
        latitude: BASE_COORDINATES.latitude + lat_offset,
        longitude: BASE_COORDINATES.longitude + lng_offset,
    }
}

pub fn synthetic_resolution(address: &str) -> AddressResolution {
    AddressResolution::Synthetic {
        coordinates: synthetic_coordinates(address),
        formatted_address: format!("{} {}", address.trim(), SYNTHETIC_MARKER),
    }
}
