use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::leads::LeadListing;
use crate::models::{
    CaptureLeadRequest, InstallerAccount, InstallerActionRequest, Lead, ReportRequest,
    SolarReport,
};
use crate::pipeline::ReportPipeline;
use crate::proxy;
use crate::services::ProviderServices;
use crate::store::{Action, AppStore, Outcome};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Provider clients, used directly by the proxy endpoints.
    pub services: ProviderServices,
    /// Address + bill → report.
    pub pipeline: ReportPipeline,
    /// Reports, leads and installer accounts for this process.
    pub store: Arc<AppStore>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let services = ProviderServices::new(&config)?;
        let pipeline = ReportPipeline::from_services(&services);
        Ok(Self::with_pipeline(config, services, pipeline))
    }

    pub fn with_pipeline(
        config: Config,
        services: ProviderServices,
        pipeline: ReportPipeline,
    ) -> Self {
        let store = Arc::new(AppStore::new(
            config.lead_price,
            config.installer_initial_credits,
        ));
        Self {
            config,
            services,
            pipeline,
            store,
        }
    }
}

/// Routes subject to rate limiting: provider proxy and application API.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Provider proxy
        .route("/api/geocode", get(proxy::proxy_geocode))
        .route("/api/solar", get(proxy::proxy_solar))
        .route("/api/gemini", post(proxy::proxy_gemini))
        // Reports
        .route("/api/v1/reports", post(create_report))
        .route("/api/v1/reports/:id", get(get_report))
        // Leads marketplace
        .route("/api/v1/leads", post(capture_lead).get(list_leads))
        .route("/api/v1/leads/:id/buy", post(buy_lead))
        .route("/api/v1/leads/:id/stage", post(advance_lead_stage))
        .route("/api/v1/installers/:id", get(get_installer))
        .route("/api/v1/installers/:id/leads", get(get_installer_leads))
}

/// Adds the health check, state and HTTP layers around `api`.
pub fn finish_router(api: Router<Arc<AppState>>, state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rust-solar-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /api/v1/reports
///
/// Runs the estimate pipeline for an address and monthly bill and stores the
/// resulting report. Provider failures degrade the report instead of failing
/// the request; only invalid input is rejected.
pub async fn create_report(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ReportRequest>,
) -> Result<(StatusCode, Json<SolarReport>), AppError> {
    tracing::info!("POST /reports - address: {}", payload.address);

    let report = state
        .pipeline
        .build_report(&payload.address, payload.monthly_bill)
        .await?;

    match state.store.dispatch(Action::SubmitReport(report)).await? {
        Outcome::ReportStored(report) => Ok((StatusCode::CREATED, Json(report))),
        other => Err(unexpected(other)),
    }
}

/// GET /api/v1/reports/:id
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SolarReport>, AppError> {
    Ok(Json(state.store.get_report(id).await?))
}

/// POST /api/v1/leads
///
/// Captures homeowner contact details for a stored report.
pub async fn capture_lead(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CaptureLeadRequest>,
) -> Result<(StatusCode, Json<Lead>), AppError> {
    tracing::info!("POST /leads - report_id: {}", payload.report_id);

    match state.store.dispatch(Action::CaptureLead(payload)).await? {
        Outcome::LeadCaptured(lead) => Ok((StatusCode::CREATED, Json(lead))),
        other => Err(unexpected(other)),
    }
}

/// GET /api/v1/leads
///
/// Public marketplace listing; contact details are always masked.
pub async fn list_leads(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LeadListing>>, AppError> {
    let listings = state
        .store
        .leads()?
        .iter()
        .map(LeadListing::from_lead)
        .collect();
    Ok(Json(listings))
}

#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub lead: Lead,
    pub installer: InstallerAccount,
}

/// POST /api/v1/leads/:id/buy
pub async fn buy_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<InstallerActionRequest>,
) -> Result<Json<PurchaseResponse>, AppError> {
    tracing::info!("POST /leads/{}/buy - installer: {}", id, payload.installer_id);

    let outcome = state
        .store
        .dispatch(Action::BuyLead {
            lead_id: id,
            installer_id: payload.installer_id,
        })
        .await
        .with_context(|| format!("Buying lead {}", id))?;

    match outcome {
        Outcome::LeadSold { lead, installer } => Ok(Json(PurchaseResponse { lead, installer })),
        other => Err(unexpected(other)),
    }
}

/// POST /api/v1/leads/:id/stage
pub async fn advance_lead_stage(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<InstallerActionRequest>,
) -> Result<Json<Lead>, AppError> {
    tracing::info!("POST /leads/{}/stage - installer: {}", id, payload.installer_id);

    let outcome = state
        .store
        .dispatch(Action::AdvancePipelineStage {
            lead_id: id,
            installer_id: payload.installer_id,
        })
        .await
        .with_context(|| format!("Advancing lead {}", id))?;

    match outcome {
        Outcome::StageAdvanced(lead) => Ok(Json(lead)),
        other => Err(unexpected(other)),
    }
}

/// GET /api/v1/installers/:id
pub async fn get_installer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<InstallerAccount>, AppError> {
    Ok(Json(state.store.installer(&id)?))
}

/// GET /api/v1/installers/:id/leads
///
/// Leads the installer bought, with contact details unmasked.
pub async fn get_installer_leads(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Lead>>, AppError> {
    Ok(Json(state.store.purchased_leads(&id)?))
}

fn unexpected(outcome: Outcome) -> AppError {
    AppError::InternalError(format!("Unexpected store outcome: {:?}", outcome))
}
