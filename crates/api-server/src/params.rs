//! Query-string parsing shared by the analytics handlers.

use crate::error::{ApiError, ApiResult};
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use outreach_backend::{CampaignFilter, StatsFilter};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters accepted by the statistics endpoints. Everything is
/// optional and kept as text so bad values produce a JSON 400.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct StatsQuery {
    /// `YYYY-MM-DD` or RFC 3339.
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Platform name; `all` means no filter.
    pub platform: Option<String>,
    /// Numeric client id; `all` means no filter.
    pub client_id: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Query parameters of the client list endpoints.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ClientListQuery {
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CampaignQuery {
    pub search: Option<String>,
    /// Campaign status; `all` means no filter.
    pub status: Option<String>,
    pub platform: Option<String>,
    pub client_id: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// The filters as applied, echoed back in responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFilters {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub platform: Option<String>,
    pub client_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// `None`, blank and `all` mean "no filter".
pub fn choice(raw: Option<&str>) -> Option<String> {
    present(raw)
        .filter(|s| !s.eq_ignore_ascii_case("all"))
        .map(str::to_string)
}

/// Calendar date from `YYYY-MM-DD`, or from an RFC 3339 instant read in `tz`.
pub fn parse_date(name: &str, raw: Option<&str>, tz: &Tz) -> ApiResult<Option<NaiveDate>> {
    let Some(raw) = present(raw) else {
        return Ok(None);
    };
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|instant| Some(instant.with_timezone(tz).date_naive()))
        .map_err(|_| ApiError::bad_request(format!("Invalid {name}: {raw}")))
}

pub fn parse_client_id(raw: Option<&str>) -> ApiResult<Option<i64>> {
    match choice(raw) {
        None => Ok(None),
        Some(id) => id
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("Invalid clientId: {id}"))),
    }
}

pub fn parse_count(name: &str, raw: Option<&str>) -> ApiResult<Option<usize>> {
    match present(raw) {
        None => Ok(None),
        Some(n) => n
            .parse::<usize>()
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("Invalid {name}: {n}"))),
    }
}

impl StatsQuery {
    pub fn stats_filter(&self, tz: &Tz) -> ApiResult<StatsFilter> {
        let start_date = parse_date("startDate", self.start_date.as_deref(), tz)?;
        let end_date = parse_date("endDate", self.end_date.as_deref(), tz)?;
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(ApiError::bad_request("startDate must not be after endDate"));
            }
        }
        Ok(StatsFilter {
            start_date,
            end_date,
            platform: choice(self.platform.as_deref()),
            client_id: parse_client_id(self.client_id.as_deref())?,
        })
    }

    pub fn search(&self) -> Option<&str> {
        present(self.search.as_deref())
    }
}

impl AppliedFilters {
    pub fn new(filter: &StatsFilter, search: Option<&str>) -> Self {
        Self {
            start_date: filter.start_date,
            end_date: filter.end_date,
            platform: filter.platform.clone(),
            client_id: filter.client_id,
            search: search.map(str::to_string),
        }
    }
}

impl ClientListQuery {
    pub fn search(&self) -> Option<&str> {
        present(self.search.as_deref())
    }
}

impl CampaignQuery {
    pub fn campaign_filter(&self) -> ApiResult<CampaignFilter> {
        Ok(CampaignFilter {
            status: choice(self.status.as_deref()),
            platform: choice(self.platform.as_deref()),
            client_id: parse_client_id(self.client_id.as_deref())?,
        })
    }

    pub fn search(&self) -> Option<&str> {
        present(self.search.as_deref())
    }
}
