//! Client list, client detail and the pooled-SQL client list.

use crate::error::{ApiError, ApiResult, ErrorResponse};
use crate::params::ClientListQuery;
use crate::rest::{observe, timestamp, AppState};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use outreach_analytics::campaigns::campaign_row;
use outreach_analytics::client_detail::{client_detail, RECENT_REPLY_LIMIT};
use outreach_analytics::clients::{client_row, ClientSortKey};
use outreach_analytics::trends::daily_trend_points;
use outreach_analytics::{filter_by_search, merge_client_rows, sort_rows, SortSpec};
use outreach_backend::{CampaignFilter, ClientSource, StatsFilter};
use outreach_core::types::{ClientDetail, ClientStatRow};
use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientListResponse {
    pub success: bool,
    pub data: Vec<ClientStatRow>,
    pub total: usize,
    pub timestamp: String,
    pub duration_seconds: f64,
}

async fn list_clients<S>(source: &S, query: &ClientListQuery) -> ApiResult<Vec<ClientStatRow>>
where
    S: ClientSource + ?Sized,
{
    let filter = StatsFilter::default();
    let (stats, masters) = futures::join!(source.client_statistics(&filter), source.clients(None));
    let mut rows = filter_by_search(merge_client_rows(&stats?, &masters?), query.search());
    sort_rows(
        &mut rows,
        SortSpec::<ClientSortKey>::parse(query.sort_by.as_deref(), query.sort_order.as_deref()),
    );
    Ok(rows)
}

fn list_response(
    rows: Vec<ClientStatRow>,
    started: Instant,
    endpoint: &'static str,
) -> ClientListResponse {
    observe(endpoint, started);
    ClientListResponse {
        success: true,
        total: rows.len(),
        data: rows,
        timestamp: timestamp(),
        duration_seconds: started.elapsed().as_secs_f64(),
    }
}

/// GET /api/clients — Every client with its statistics.
#[utoipa::path(
    get,
    path = "/api/clients",
    tag = "Clients",
    params(ClientListQuery),
    responses(
        (status = 200, description = "Client rows", body = ClientListResponse),
        (status = 500, description = "Backend failure", body = ErrorResponse),
    )
)]
pub async fn handle_list_clients(
    State(state): State<AppState>,
    Query(query): Query<ClientListQuery>,
) -> ApiResult<Json<ClientListResponse>> {
    let started = Instant::now();
    let rows = list_clients(state.backend.as_ref(), &query).await?;
    Ok(Json(list_response(rows, started, "clients.list")))
}

/// GET /api/clients-direct — Same as `/api/clients`, read over pooled SQL.
#[utoipa::path(
    get,
    path = "/api/clients-direct",
    tag = "Clients",
    params(ClientListQuery),
    responses(
        (status = 200, description = "Client rows", body = ClientListResponse),
        (status = 503, description = "Direct database access not configured", body = ErrorResponse),
        (status = 500, description = "Database failure", body = ErrorResponse),
    )
)]
pub async fn handle_list_clients_direct(
    State(state): State<AppState>,
    Query(query): Query<ClientListQuery>,
) -> ApiResult<Json<ClientListResponse>> {
    let started = Instant::now();
    let direct = state.direct.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("Direct database access is not configured".to_string())
    })?;
    let rows = list_clients(direct.as_ref(), &query).await?;
    info!(rows = rows.len(), source = direct.name(), "Served direct client list");
    Ok(Json(list_response(rows, started, "clients.direct")))
}

/// HEAD /api/clients-direct — 200 when the pool can run `SELECT 1`.
#[utoipa::path(
    head,
    path = "/api/clients-direct",
    tag = "Clients",
    responses(
        (status = 200, description = "Database reachable"),
        (status = 503, description = "Database unreachable or not configured"),
    )
)]
pub async fn handle_clients_direct_probe(State(state): State<AppState>) -> StatusCode {
    let Some(direct) = state.direct.as_ref() else {
        return StatusCode::SERVICE_UNAVAILABLE;
    };
    match direct.ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            warn!(error = %e, "Direct database probe failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// GET /api/clients/:id — Detail page for one client.
#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    tag = "Clients",
    params(("id" = String, Path, description = "Numeric client id")),
    responses(
        (status = 200, description = "Client detail", body = ClientDetail),
        (status = 400, description = "Non-numeric id", body = ErrorResponse),
        (status = 404, description = "No such client", body = ErrorResponse),
        (status = 500, description = "Backend failure", body = ErrorResponse),
    )
)]
pub async fn handle_client_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ClientDetail>> {
    let started = Instant::now();
    let client_id: i64 = id
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid client ID"))?;

    let stats_filter = StatsFilter {
        client_id: Some(client_id),
        ..StatsFilter::default()
    };
    let campaign_filter = CampaignFilter {
        client_id: Some(client_id),
        ..CampaignFilter::default()
    };
    let trend_filter = StatsFilter::default();
    let backend = state.backend.as_ref();
    let (masters, stats, campaigns, replies, trends) = futures::join!(
        backend.clients(Some(client_id)),
        backend.client_statistics(&stats_filter),
        backend.campaigns(&campaign_filter),
        backend.recent_replies(client_id, RECENT_REPLY_LIMIT),
        backend.client_daily_trends(client_id, &trend_filter),
    );
    let (masters, stats) = (masters?, stats?);

    let master = masters.iter().find(|m| m.id == client_id);
    let stat = stats.iter().find(|s| s.client_id == client_id);
    if master.is_none() && stat.is_none() {
        return Err(ApiError::not_found("Client not found"));
    }

    let detail = client_detail(
        client_row(client_id, stat, master),
        campaigns?.into_iter().map(campaign_row).collect(),
        replies?,
        daily_trend_points(trends?),
    );
    observe("clients.detail", started);
    Ok(Json(detail))
}
