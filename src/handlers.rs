use crate::aturiya_client::AturiyaClient;
use crate::config::Config;
use crate::enrichment::enrich_one;
use crate::errors::AppError;
use crate::models::{Campaign, EnrichedLead, RawLead};
use crate::pipe0_client::Pipe0Client;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use moka::future::Cache;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

const CAMPAIGNS_CACHE_KEY: &str = "campaigns";

/// Shared application state injected into handlers.
///
/// Both clients are constructed once at startup; handlers never build
/// their own.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub aturiya: AturiyaClient,
    pub pipe0: Pipe0Client,
    /// Campaign list of the configured agent (60 s TTL).
    pub campaigns_cache: Cache<String, Vec<Campaign>>,
}

impl AppState {
    pub fn new(config: Config, aturiya: AturiyaClient, pipe0: Pipe0Client) -> Self {
        let campaigns_cache = Cache::builder()
            .time_to_live(Duration::from_secs(60))
            .max_capacity(16)
            .build();
        Self {
            config,
            aturiya,
            pipe0,
            campaigns_cache,
        }
    }
}

/// Routes plus the layers every request goes through. Rate limiting is
/// added by the server binary, which has the peer address.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/campaigns", get(list_campaigns))
        .route("/api/campaigns/:campaign_id/leads", get(list_campaign_leads))
        .route("/api/leads/:lead_id/enrich", post(enrich_lead))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rust-lead-enrichment",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// GET /api/campaigns
pub async fn list_campaigns(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Campaign>>, AppError> {
    if let Some(cached) = state.campaigns_cache.get(CAMPAIGNS_CACHE_KEY).await {
        tracing::debug!("Campaign cache HIT ({} campaigns)", cached.len());
        return Ok(Json(cached));
    }

    let campaigns = state.aturiya.list_campaigns().await?;
    tracing::info!("GET /api/campaigns - {} campaigns", campaigns.len());
    state
        .campaigns_cache
        .insert(CAMPAIGNS_CACHE_KEY.to_string(), campaigns.clone())
        .await;

    Ok(Json(campaigns))
}

/// GET /api/campaigns/:campaign_id/leads
///
/// Walks every page before answering.
pub async fn list_campaign_leads(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<String>,
) -> Result<Json<Vec<RawLead>>, AppError> {
    tracing::info!("GET /api/campaigns/{}/leads", campaign_id);
    let leads = state.aturiya.get_all_leads(&campaign_id).await?;
    Ok(Json(leads))
}

/// POST /api/leads/:lead_id/enrich
///
/// Enriches the submitted lead synchronously. Vendor trouble degrades to an
/// unenriched lead rather than an error.
pub async fn enrich_lead(
    State(state): State<Arc<AppState>>,
    Path(lead_id): Path<String>,
    Json(raw): Json<RawLead>,
) -> Result<Json<EnrichedLead>, AppError> {
    if raw.lead_id != lead_id {
        return Err(AppError::BadRequest(format!(
            "Path lead_id '{}' does not match body lead_id '{}'",
            lead_id, raw.lead_id
        )));
    }

    tracing::info!("POST /api/leads/{}/enrich", lead_id);
    let enriched = enrich_one(&state.pipe0, &state.config.enrichment, &raw).await;

    Ok(Json(enriched))
}
