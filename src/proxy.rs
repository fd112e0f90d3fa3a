//! Provider proxy endpoints.
//!
//! Re-expose the geocoding, solar and text-generation providers over plain
//! HTTP so keys stay server side. Upstream status and JSON body are relayed
//! as-is; clients apply the same success checks they apply to the provider.

use crate::errors::AppError;
use crate::handlers::AppState;
use crate::llm::GenerationRequest;
use crate::models::Coordinates;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct GeocodeQuery {
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SolarQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// GET /api/geocode?address=...
pub async fn proxy_geocode(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GeocodeQuery>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let address = query
        .address
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing 'address' parameter".to_string()))?;

    tracing::info!("Proxy geocode: {}", address);
    let (status, body) = state.services.geocoding.fetch_upstream(address).await?;
    Ok((status, Json(body)))
}

/// GET /api/solar?lat=..&lng=..
pub async fn proxy_solar(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SolarQuery>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let (latitude, longitude) = match (query.lat, query.lng) {
        (Some(lat), Some(lng)) => (lat, lng),
        _ => {
            return Err(AppError::BadRequest(
                "Missing 'lat' or 'lng' parameter".to_string(),
            ))
        }
    };
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::BadRequest("Coordinates out of range".to_string()));
    }

    tracing::info!("Proxy solar: {}, {}", latitude, longitude);
    let (status, body) = state
        .services
        .solar
        .fetch_upstream(Coordinates {
            latitude,
            longitude,
        })
        .await?;
    Ok((status, Json(body)))
}

/// POST /api/gemini
pub async fn proxy_gemini(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerationRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if request.prompt.trim().is_empty() {
        return Err(AppError::BadRequest("Missing 'prompt'".to_string()));
    }

    tracing::info!(
        "Proxy gemini: {} chars, {} history turns",
        request.prompt.len(),
        request.history.len()
    );
    let (status, body) = state.services.gemini.generate_upstream(&request).await?;
    Ok((status, Json(body)))
}
