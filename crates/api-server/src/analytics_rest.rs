//! Dashboard statistics endpoints under `/api/analytics`.

use crate::error::{ApiError, ApiResult, ErrorResponse};
use crate::params::{AppliedFilters, StatsQuery};
use crate::rest::{observe, timestamp, AppState};
use axum::extract::{Query, State};
use axum::Json;
use outreach_analytics::clients::ClientSortKey;
use outreach_analytics::fanout::fan_out;
use outreach_analytics::platform::{filter_platform, platform_rows};
use outreach_analytics::trends::send_volume_series;
use outreach_analytics::{filter_by_search, kpi_overview, merge_client_rows, sort_rows, SortSpec};
use outreach_backend::StatsFilter;
use outreach_core::types::{ClientStatRow, KpiOverview, PlatformPerformanceRow, SendVolumePoint};
use serde::Serialize;
use std::time::Instant;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KpiResponse {
    pub success: bool,
    pub data: KpiOverview,
    pub filters: AppliedFilters,
    pub timestamp: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientStatisticsResponse {
    pub success: bool,
    pub data: Vec<ClientStatRow>,
    pub filters: AppliedFilters,
    pub timestamp: String,
}

/// What one platform source returned.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RawSourceData {
    pub source: String,
    pub row_count: usize,
    pub error: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformPerformanceResponse {
    pub success: bool,
    pub data: Vec<PlatformPerformanceRow>,
    pub raw_data: Vec<RawSourceData>,
    pub timestamp: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendVolumeResponse {
    pub success: bool,
    pub data: Vec<SendVolumePoint>,
    pub timestamp: String,
}

/// GET /api/analytics/kpi — Headline totals and rates.
#[utoipa::path(
    get,
    path = "/api/analytics/kpi",
    tag = "Analytics",
    params(StatsQuery),
    responses(
        (status = 200, description = "KPI overview", body = KpiResponse),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 500, description = "Backend failure", body = ErrorResponse),
    )
)]
pub async fn handle_kpi(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<KpiResponse>> {
    let started = Instant::now();
    let filter = query.stats_filter(&state.timezone)?;
    let totals = state.backend.kpi_totals(&filter).await?;

    observe("analytics.kpi", started);
    Ok(Json(KpiResponse {
        success: true,
        data: kpi_overview(&totals),
        filters: AppliedFilters::new(&filter, None),
        timestamp: timestamp(),
    }))
}

/// GET /api/analytics/client-statistics — Per-client statistics.
#[utoipa::path(
    get,
    path = "/api/analytics/client-statistics",
    tag = "Analytics",
    params(StatsQuery),
    responses(
        (status = 200, description = "Client statistics rows", body = ClientStatisticsResponse),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 500, description = "Backend failure", body = ErrorResponse),
    )
)]
pub async fn handle_client_statistics(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<ClientStatisticsResponse>> {
    let started = Instant::now();
    let filter = query.stats_filter(&state.timezone)?;

    let (stats, masters) = futures::join!(
        state.backend.client_statistics(&filter),
        state.backend.clients(filter.client_id),
    );
    let mut rows = filter_by_search(merge_client_rows(&stats?, &masters?), query.search());
    sort_rows(
        &mut rows,
        SortSpec::<ClientSortKey>::parse(query.sort_by.as_deref(), query.sort_order.as_deref()),
    );

    observe("analytics.client_statistics", started);
    Ok(Json(ClientStatisticsResponse {
        success: true,
        data: rows,
        filters: AppliedFilters::new(&filter, query.search()),
        timestamp: timestamp(),
    }))
}

/// GET /api/analytics/platform-performance — One row per sending platform.
///
/// Platforms are fetched concurrently; a failing platform is reported in
/// `rawData` and the others are still returned.
#[utoipa::path(
    get,
    path = "/api/analytics/platform-performance",
    tag = "Analytics",
    params(StatsQuery),
    responses(
        (status = 200, description = "Platform rows", body = PlatformPerformanceResponse),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 500, description = "Every platform failed", body = ErrorResponse),
    )
)]
pub async fn handle_platform_performance(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<PlatformPerformanceResponse>> {
    let started = Instant::now();
    let filter = query.stats_filter(&state.timezone)?;
    // The platform parameter narrows the output, not the per-platform calls.
    let fetch_filter = StatsFilter {
        platform: None,
        ..filter.clone()
    };

    let backend = state.backend.as_ref();
    let fetch_filter = &fetch_filter;
    let outcomes = fan_out(&state.dashboard.platforms, |platform| async move {
        backend.platform_performance(&platform, fetch_filter).await
    })
    .await;

    let raw_data: Vec<RawSourceData> = outcomes
        .iter()
        .map(|o| RawSourceData {
            source: o.source.clone(),
            row_count: o.result.as_ref().map_or(0, Vec::len),
            error: o.result.as_ref().err().map(|e| e.public_message()),
        })
        .collect();

    let merged = platform_rows(outcomes);
    if merged.all_failed(raw_data.len()) {
        let message = merged
            .failures
            .first()
            .map(|f| f.error.clone())
            .unwrap_or_default();
        return Err(ApiError::Internal(message));
    }

    observe("analytics.platform_performance", started);
    Ok(Json(PlatformPerformanceResponse {
        success: true,
        data: filter_platform(merged.rows, filter.platform.as_deref()),
        raw_data,
        timestamp: timestamp(),
    }))
}

/// GET /api/analytics/send-volume-trends — Daily send volume across platforms.
#[utoipa::path(
    get,
    path = "/api/analytics/send-volume-trends",
    tag = "Analytics",
    params(StatsQuery),
    responses(
        (status = 200, description = "Daily series", body = SendVolumeResponse),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 500, description = "Backend failure", body = ErrorResponse),
    )
)]
pub async fn handle_send_volume_trends(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<SendVolumeResponse>> {
    let started = Instant::now();
    let filter = query.stats_filter(&state.timezone)?;
    let rows = state.backend.send_volume_trends(&filter).await?;

    observe("analytics.send_volume_trends", started);
    Ok(Json(SendVolumeResponse {
        success: true,
        data: send_volume_series(&rows, filter.start_date, filter.end_date),
        timestamp: timestamp(),
    }))
}
