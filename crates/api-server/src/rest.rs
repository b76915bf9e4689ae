//! Shared handler state and operational endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono_tz::Tz;
use outreach_backend::{AnalyticsBackend, ClientSource};
use outreach_core::config::{AppConfig, DashboardConfig};
use outreach_core::DashboardResult;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;
use utoipa::ToSchema;

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn AnalyticsBackend>,
    /// Pooled SQL source behind `/api/clients-direct`, when configured.
    pub direct: Option<Arc<dyn ClientSource>>,
    pub dashboard: Arc<DashboardConfig>,
    pub timezone: Tz,
    pub node_id: String,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        backend: Arc<dyn AnalyticsBackend>,
        direct: Option<Arc<dyn ClientSource>>,
    ) -> DashboardResult<Self> {
        Ok(Self {
            backend,
            direct,
            timezone: config.dashboard.tz()?,
            dashboard: Arc::new(config.dashboard.clone()),
            node_id: config.node_id.clone(),
            start_time: Instant::now(),
        })
    }
}

/// Count the request and record its latency under `endpoint`.
pub(crate) fn observe(endpoint: &'static str, started: Instant) -> u64 {
    let elapsed_ms = started.elapsed().as_millis() as u64;
    metrics::counter!("api.requests", "endpoint" => endpoint).increment(1);
    metrics::histogram!("api.response_time_ms", "endpoint" => endpoint).record(elapsed_ms as f64);
    elapsed_ms
}

pub(crate) fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// GET /health — Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Operations",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: state.node_id.clone(),
        backend: state.backend.name().to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /ready — 200 once the analytics backend answers.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "Operations",
    responses(
        (status = 200, description = "Backend reachable"),
        (status = 503, description = "Backend unreachable"),
    )
)]
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.backend.ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            warn!(error = %e, backend = state.backend.name(), "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// GET /live — Liveness probe.
#[utoipa::path(
    get,
    path = "/live",
    tag = "Operations",
    responses((status = 200, description = "Process alive"))
)]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub backend: String,
    pub uptime_secs: u64,
}
