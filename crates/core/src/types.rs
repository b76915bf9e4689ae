//! View models returned by the analytics endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-client statistics merged with the client master record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientStatRow {
    pub client_id: i64,
    pub client_name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub industry: String,
    pub website: String,
    /// Whether an Instantly API key is on file (the key itself is never returned).
    pub has_instantly_key: bool,
    pub has_smartlead_key: bool,
    pub emails_sent: i64,
    pub replies: i64,
    pub reply_rate: f64,
    pub positive_replies: i64,
    pub positive_rate: f64,
    pub bounces: i64,
    pub bounce_rate: f64,
    pub unique_leads: i64,
    pub onboarding_date: Option<NaiveDate>,
    pub services: Vec<String>,
}

/// A campaign with its derived rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRow {
    pub id: i64,
    pub campaign_id: String,
    pub campaign_name: String,
    pub client_id: Option<i64>,
    pub client_name: String,
    pub platform: String,
    pub status: String,
    pub emails_sent: i64,
    pub replies: i64,
    pub positive_replies: i64,
    pub bounces: i64,
    pub leads_count: i64,
    pub reply_rate: f64,
    pub positive_rate: f64,
    pub bounce_rate: f64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformPerformanceRow {
    pub platform: String,
    pub total_sends: i64,
    pub total_replies: i64,
    pub reply_rate: f64,
    pub bounce_rate: f64,
    pub total_leads: i64,
    pub positive_rate: f64,
    pub campaign_count: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KpiOverview {
    pub total_emails_sent: i64,
    pub unique_leads_connected: i64,
    pub total_replies: i64,
    pub reply_rate: f64,
    pub total_bounce: i64,
    pub bounce_rate: f64,
    pub positive_replies: i64,
    pub positive_replies_rate: f64,
    /// Emails sent per positive reply.
    pub send_positive_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendVolumePoint {
    pub date: NaiveDate,
    pub emails_sent: i64,
    pub replies: i64,
    pub bounces: i64,
    pub reply_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TileFormat {
    Number,
    Percent,
    Ratio,
}

/// One metric tile on a detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KpiTile {
    pub key: String,
    pub label: String,
    pub value: f64,
    pub format: TileFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplySummary {
    pub id: i64,
    pub campaign_id: Option<String>,
    pub lead_email: String,
    pub category: String,
    pub is_positive: bool,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyTrendPoint {
    pub date: NaiveDate,
    pub emails_sent: i64,
    pub replies: i64,
    pub positive_replies: i64,
    pub bounces: i64,
}

/// A client's campaigns grouped by sending platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformBreakdown {
    pub platform: String,
    pub campaigns: i64,
    pub emails_sent: i64,
    pub replies: i64,
    pub positive_replies: i64,
    pub reply_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    CampaignLaunched,
    ReplyReceived,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub kind: ActivityKind,
    pub title: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientDetail {
    pub client: ClientStatRow,
    pub kpi_data: Vec<KpiTile>,
    pub campaigns: Vec<CampaignRow>,
    pub recent_replies: Vec<ReplySummary>,
    pub daily_trends: Vec<DailyTrendPoint>,
    pub platform_breakdown: Vec<PlatformBreakdown>,
    pub activity: Vec<ActivityEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}
