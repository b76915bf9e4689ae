//! API server: the REST router plus the Prometheus exporter.

use crate::rest::{self, AppState};
use crate::swagger::ApiDoc;
use crate::{analytics_rest, campaign_rest, client_rest};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use outreach_core::config::AppConfig;
use std::any::Any;
use std::net::SocketAddr;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Answer a panicking handler with a JSON 500 instead of dropping the
/// connection.
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = detail, "Handler panicked");
    metrics::counter!("api.errors", "kind" => "panic").increment(1);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "application/json")],
        r#"{"error":"Internal server error"}"#,
    )
        .into_response()
}

/// Every route, with middleware, bound to `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Analytics
        .route("/api/analytics/kpi", get(analytics_rest::handle_kpi))
        .route(
            "/api/analytics/client-statistics",
            get(analytics_rest::handle_client_statistics),
        )
        .route(
            "/api/analytics/platform-performance",
            get(analytics_rest::handle_platform_performance),
        )
        .route(
            "/api/analytics/send-volume-trends",
            get(analytics_rest::handle_send_volume_trends),
        )
        // Campaigns
        .route("/api/campaigns", get(campaign_rest::handle_list_campaigns))
        .route("/api/campaigns/:id", get(campaign_rest::handle_campaign_detail))
        // Clients
        .route("/api/clients", get(client_rest::handle_list_clients))
        .route("/api/clients/:id", get(client_rest::handle_client_detail))
        .route(
            "/api/clients-direct",
            get(client_rest::handle_list_clients_direct)
                .head(client_rest::handle_clients_direct_probe),
        )
        // Operational endpoints
        .route("/health", get(rest::health_check))
        .route("/ready", get(rest::readiness))
        .route("/live", get(rest::liveness))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct ApiServer {
    config: AppConfig,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: AppConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Start the HTTP REST server.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let app = router(self.state.clone());

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, backend = self.state.backend.name(), "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the metrics server on a separate port.
    pub async fn start_metrics(&self) -> anyhow::Result<()> {
        if !self.config.metrics.enabled {
            info!("Metrics exporter disabled");
            return Ok(());
        }

        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");
        Ok(())
    }
}
