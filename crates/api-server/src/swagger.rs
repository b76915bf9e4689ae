//! OpenAPI document and Swagger UI configuration.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Outreach Dashboard API",
        version = "0.1.0",
        description = "Client, campaign and platform statistics for cold-outreach campaigns.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Analytics", description = "KPI totals and per-client, per-platform statistics"),
        (name = "Campaigns", description = "Campaign list and detail"),
        (name = "Clients", description = "Client list and detail"),
        (name = "Operations", description = "Health, readiness, and liveness probes"),
    ),
    paths(
        // Analytics
        crate::analytics_rest::handle_kpi,
        crate::analytics_rest::handle_client_statistics,
        crate::analytics_rest::handle_platform_performance,
        crate::analytics_rest::handle_send_volume_trends,
        // Campaigns
        crate::campaign_rest::handle_list_campaigns,
        crate::campaign_rest::handle_campaign_detail,
        // Clients
        crate::client_rest::handle_list_clients,
        crate::client_rest::handle_list_clients_direct,
        crate::client_rest::handle_clients_direct_probe,
        crate::client_rest::handle_client_detail,
        // Operations
        crate::rest::health_check,
        crate::rest::readiness,
        crate::rest::liveness,
    ),
    components(schemas(
        // View models
        outreach_core::types::ClientStatRow,
        outreach_core::types::CampaignRow,
        outreach_core::types::PlatformPerformanceRow,
        outreach_core::types::KpiOverview,
        outreach_core::types::SendVolumePoint,
        outreach_core::types::TileFormat,
        outreach_core::types::KpiTile,
        outreach_core::types::ReplySummary,
        outreach_core::types::DailyTrendPoint,
        outreach_core::types::PlatformBreakdown,
        outreach_core::types::ActivityKind,
        outreach_core::types::ActivityEntry,
        outreach_core::types::ClientDetail,
        outreach_core::types::Pagination,
        // Envelopes
        crate::params::AppliedFilters,
        crate::analytics_rest::KpiResponse,
        crate::analytics_rest::ClientStatisticsResponse,
        crate::analytics_rest::RawSourceData,
        crate::analytics_rest::PlatformPerformanceResponse,
        crate::analytics_rest::SendVolumeResponse,
        crate::campaign_rest::ResponseMeta,
        crate::campaign_rest::CampaignListResponse,
        crate::campaign_rest::CampaignDetail,
        crate::campaign_rest::CampaignDetailResponse,
        crate::client_rest::ClientListResponse,
        crate::error::ErrorResponse,
        crate::rest::HealthResponse,
    ))
)]
pub struct ApiDoc;
