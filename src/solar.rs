use crate::circuit_breaker::{call_guarded, create_proxy_circuit_breaker, ProxyCircuitBreaker};
use crate::config::Config;
use crate::errors::AppError;
use crate::models::Coordinates;
use crate::services::{read_json, relay_json};
use axum::http::StatusCode;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Panel rating assumed when the provider omits `panelCapacityWatts`.
pub const DEFAULT_PANEL_CAPACITY_WATTS: f64 = 400.0;

/// Minimum imagery quality requested from the provider.
pub const REQUIRED_QUALITY: &str = "HIGH";

// ============ Provider schema ============

/// Building insights for the roof closest to a coordinate.
///
/// Read-only input to the estimator and passed through to the report for
/// visualization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingInsights {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub center: Option<LatLng>,
    #[serde(default)]
    pub imagery_quality: Option<String>,
    pub solar_potential: SolarPotential,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolarPotential {
    pub max_array_panels_count: u32,
    #[serde(default)]
    pub max_array_area_meters2: f64,
    #[serde(default)]
    pub max_sunshine_hours_per_year: f64,
    #[serde(default)]
    pub panel_capacity_watts: Option<f64>,
    #[serde(default)]
    pub roof_segment_stats: Vec<RoofSegmentStats>,
    #[serde(default)]
    pub solar_panel_configs: Vec<SolarPanelConfig>,
    #[serde(default)]
    pub solar_panels: Vec<SolarPanel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoofSegmentStats {
    #[serde(default)]
    pub pitch_degrees: f64,
    #[serde(default)]
    pub azimuth_degrees: f64,
    pub stats: SizeAndSunshineStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeAndSunshineStats {
    #[serde(default)]
    pub area_meters2: f64,
    #[serde(default)]
    pub sunshine_quantiles: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolarPanelConfig {
    pub panels_count: u32,
    #[serde(default)]
    pub yearly_energy_dc_kwh: f64,
    #[serde(default)]
    pub roof_segment_summaries: Vec<RoofSegmentSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoofSegmentSummary {
    #[serde(default)]
    pub panels_count: u32,
    #[serde(default)]
    pub yearly_energy_dc_kwh: f64,
    #[serde(default)]
    pub segment_index: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PanelOrientation {
    Landscape,
    Portrait,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolarPanel {
    pub center: LatLng,
    #[serde(default)]
    pub orientation: Option<PanelOrientation>,
    #[serde(default)]
    pub yearly_energy_dc_kwh: f64,
    #[serde(default)]
    pub segment_index: Option<u32>,
}

impl BuildingInsights {
    /// Capacity of a fully populated roof in kWp.
    pub fn roof_capacity_kw(&self) -> f64 {
        let watts = self
            .solar_potential
            .panel_capacity_watts
            .filter(|w| *w > 0.0)
            .unwrap_or(DEFAULT_PANEL_CAPACITY_WATTS);
        self.solar_potential.max_array_panels_count as f64 * watts / 1000.0
    }

    /// Sum of all roof segment areas in m².
    pub fn roof_area_m2(&self) -> f64 {
        self.solar_potential
            .roof_segment_stats
            .iter()
            .map(|segment| segment.stats.area_meters2)
            .sum()
    }

    /// Largest layout the provider suggested.
    pub fn largest_panel_config(&self) -> Option<&SolarPanelConfig> {
        self.solar_potential
            .solar_panel_configs
            .iter()
            .max_by_key(|config| config.panels_count)
    }
}

// ============ Client ============

/// Fetches roof potential for a coordinate.
#[derive(Clone)]
pub struct SolarPotentialClient {
    client: Client,
    proxy_base_url: Option<String>,
    base_url: String,
    api_key: String,
    proxy_breaker: ProxyCircuitBreaker,
}

impl SolarPotentialClient {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            proxy_base_url: config.proxy_base_url.clone(),
            base_url: config.solar_base_url.clone(),
            api_key: config.google_maps_api_key.clone(),
            proxy_breaker: create_proxy_circuit_breaker(),
        }
    }

    /// Building insights for `coordinates`, or `None` on any failure.
    ///
    /// Unsupported locations (404), other non-2xx answers, network errors and
    /// schema mismatches are all reported as absence.
    pub async fn fetch_solar_potential(
        &self,
        coordinates: Coordinates,
    ) -> Option<BuildingInsights> {
        if let Some(ref proxy) = self.proxy_base_url {
            match call_guarded(&self.proxy_breaker, self.fetch_via_proxy(proxy, coordinates))
                .await
            {
                Ok(insights) => {
                    tracing::info!("✓ Solar potential fetched via proxy");
                    return Some(insights);
                }
                Err(e) => tracing::warn!("Solar proxy failed, trying provider: {}", e),
            }
        }

        match self.fetch_direct(coordinates).await {
            Ok(insights) => {
                tracing::info!(
                    "✓ Solar potential fetched: {} panels max",
                    insights.solar_potential.max_array_panels_count
                );
                Some(insights)
            }
            Err(e) => {
                tracing::warn!("Solar potential unavailable: {}", e);
                None
            }
        }
    }

    async fn fetch_via_proxy(
        &self,
        proxy: &str,
        coordinates: Coordinates,
    ) -> Result<BuildingInsights, AppError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/api/solar", proxy),
            &[
                ("lat", coordinates.latitude.to_string()),
                ("lng", coordinates.longitude.to_string()),
            ],
        )
        .map_err(|e| AppError::ExternalApiError(format!("Failed to build URL: {}", e)))?;

        let response =
            self.client.get(url).send().await.map_err(|e| {
                AppError::ExternalApiError(format!("Solar proxy request failed: {}", e))
            })?;

        read_json(response, "Solar proxy").await
    }

    async fn fetch_direct(&self, coordinates: Coordinates) -> Result<BuildingInsights, AppError> {
        let response = self.send_upstream(coordinates).await?;
        read_json(response, "Solar").await
    }

    /// Raw upstream call used by the proxy endpoint.
    pub async fn fetch_upstream(
        &self,
        coordinates: Coordinates,
    ) -> Result<(StatusCode, Value), AppError> {
        let response = self.send_upstream(coordinates).await?;
        relay_json(response, "Solar").await
    }

    async fn send_upstream(&self, coordinates: Coordinates) -> Result<reqwest::Response, AppError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/v1/buildingInsights:findClosest", self.base_url),
            &[
                ("location.latitude", coordinates.latitude.to_string()),
                ("location.longitude", coordinates.longitude.to_string()),
                ("requiredQuality", REQUIRED_QUALITY.to_string()),
                ("key", self.api_key.clone()),
            ],
        )
        .map_err(|e| AppError::ExternalApiError(format!("Failed to build URL: {}", e)))?;

        tracing::debug!(
            "Solar URL: {}/v1/buildingInsights:findClosest?location.latitude={}&location.longitude={}&key=[REDACTED]",
            self.base_url,
            coordinates.latitude,
            coordinates.longitude
        );

        self.client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Solar request failed: {}", e)))
    }
}
