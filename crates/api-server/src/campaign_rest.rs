//! Campaign list and detail endpoints.

use crate::error::{ApiError, ApiResult, ErrorResponse};
use crate::params::{parse_count, CampaignQuery};
use crate::rest::{observe, timestamp, AppState};
use axum::extract::{Path, Query, State};
use axum::Json;
use outreach_analytics::campaigns::{campaign_row, CampaignSortKey};
use outreach_analytics::kpi::{kpi_tiles, MetricTotals};
use outreach_analytics::{
    filter_by_search, paginate, resolve_campaign, sort_rows, PageRequest, SortSpec,
};
use outreach_core::types::{CampaignRow, KpiTile, Pagination};
use serde::Serialize;
use std::time::Instant;
use tracing::debug;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    /// Handler time in milliseconds.
    pub response_time: u64,
    pub timestamp: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignListResponse {
    pub success: bool,
    pub data: Vec<CampaignRow>,
    pub pagination: Pagination,
    pub meta: ResponseMeta,
}

/// A campaign with its nine metric tiles.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignDetail {
    #[serde(flatten)]
    pub campaign: CampaignRow,
    pub kpi_data: Vec<KpiTile>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignDetailResponse {
    pub success: bool,
    pub data: CampaignDetail,
    pub meta: ResponseMeta,
}

/// GET /api/campaigns — Filtered, sorted, paginated campaign list.
#[utoipa::path(
    get,
    path = "/api/campaigns",
    tag = "Campaigns",
    params(CampaignQuery),
    responses(
        (status = 200, description = "One page of campaigns", body = CampaignListResponse),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 500, description = "Backend failure", body = ErrorResponse),
    )
)]
pub async fn handle_list_campaigns(
    State(state): State<AppState>,
    Query(query): Query<CampaignQuery>,
) -> ApiResult<Json<CampaignListResponse>> {
    let started = Instant::now();
    let filter = query.campaign_filter()?;
    let page_request = PageRequest::new(
        parse_count("page", query.page.as_deref())?,
        parse_count("limit", query.limit.as_deref())?,
        state.dashboard.default_page_size,
        state.dashboard.max_page_size,
    );

    let records = state.backend.campaigns(&filter).await?;
    let rows: Vec<CampaignRow> = records.into_iter().map(campaign_row).collect();
    let mut rows = filter_by_search(rows, query.search());
    sort_rows(
        &mut rows,
        SortSpec::<CampaignSortKey>::parse(query.sort_by.as_deref(), query.sort_order.as_deref()),
    );
    let (data, pagination) = paginate(rows, page_request);

    Ok(Json(CampaignListResponse {
        success: true,
        data,
        pagination,
        meta: ResponseMeta {
            response_time: observe("campaigns.list", started),
            timestamp: timestamp(),
        },
    }))
}

/// GET /api/campaigns/:id — Campaign by external id, or by numeric id.
#[utoipa::path(
    get,
    path = "/api/campaigns/{id}",
    tag = "Campaigns",
    params(("id" = String, Path, description = "External campaign id or numeric row id")),
    responses(
        (status = 200, description = "Campaign with KPI tiles", body = CampaignDetailResponse),
        (status = 404, description = "No such campaign", body = ErrorResponse),
        (status = 500, description = "Backend failure", body = ErrorResponse),
    )
)]
pub async fn handle_campaign_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CampaignDetailResponse>> {
    let started = Instant::now();
    let record = resolve_campaign(state.backend.as_ref(), id.trim())
        .await?
        .ok_or_else(|| {
            debug!(campaign = %id, "Campaign lookup missed");
            ApiError::not_found("Campaign not found")
        })?;

    let campaign = campaign_row(record);
    let kpi_data = kpi_tiles(&MetricTotals::from(&campaign));

    Ok(Json(CampaignDetailResponse {
        success: true,
        data: CampaignDetail { campaign, kpi_data },
        meta: ResponseMeta {
            response_time: observe("campaigns.detail", started),
            timestamp: timestamp(),
        },
    }))
}
