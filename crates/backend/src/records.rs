//! Row schemas as returned by the backend tables and RPC functions.
//!
//! Aggregate columns are non-null (the SQL functions coalesce them); a missing
//! or null count is a decode error.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// `clients` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClientRecord {
    pub id: i64,
    pub client_name: String,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub instantly_api_key: Option<String>,
    #[serde(default)]
    pub smartlead_api_key: Option<String>,
    #[serde(default)]
    pub onboarding_date: Option<NaiveDate>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// `get_client_statistics` RPC row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClientStatsRecord {
    pub client_id: i64,
    #[serde(default)]
    pub client_name: Option<String>,
    pub emails_sent: i64,
    pub replies: i64,
    pub positive_replies: i64,
    pub bounces: i64,
    pub unique_leads: i64,
    #[serde(default)]
    pub onboarding_date: Option<NaiveDate>,
    #[serde(default)]
    pub services: Option<Vec<String>>,
}

/// `campaigns` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignRecord {
    pub id: i64,
    #[serde(default)]
    pub campaign_id: Option<String>,
    pub campaign_name: String,
    #[serde(default)]
    pub client_id: Option<i64>,
    #[serde(default)]
    pub client_name: Option<String>,
    pub platform: String,
    #[serde(default)]
    pub status: Option<String>,
    pub emails_sent: i64,
    pub replies: i64,
    pub positive_replies: i64,
    pub bounced: i64,
    pub leads_count: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// `get_platform_performance` RPC row, one call per platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformPerformanceRecord {
    #[serde(default)]
    pub platform: Option<String>,
    pub total_sends: i64,
    pub total_replies: i64,
    pub positive_replies: i64,
    pub bounces: i64,
    pub total_leads: i64,
    pub campaign_count: i64,
}

/// `get_send_volume_trends` RPC row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendVolumeRecord {
    pub date: NaiveDate,
    #[serde(default)]
    pub platform: Option<String>,
    pub emails_sent: i64,
    pub replies: i64,
    pub bounces: i64,
}

/// `get_kpi_metrics` RPC row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiTotalsRecord {
    pub total_emails_sent: i64,
    pub unique_leads_connected: i64,
    pub total_replies: i64,
    pub total_bounce: i64,
    pub positive_replies: i64,
}

/// `replies` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyRecord {
    pub id: i64,
    #[serde(default)]
    pub client_id: Option<i64>,
    #[serde(default)]
    pub campaign_id: Option<String>,
    pub lead_email: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_positive: bool,
    pub received_at: DateTime<Utc>,
}

/// `get_client_daily_trends` RPC row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTrendRecord {
    pub date: NaiveDate,
    pub emails_sent: i64,
    pub replies: i64,
    pub positive_replies: i64,
    pub bounces: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_count_is_a_decode_error() {
        let raw = r#"[{"client_id": 7, "emails_sent": null, "replies": 1,
            "positive_replies": 0, "bounces": 0, "unique_leads": 3}]"#;
        assert!(serde_json::from_str::<Vec<ClientStatsRecord>>(raw).is_err());
    }

    #[test]
    fn test_optional_columns_may_be_absent() {
        let raw = r#"{"id": 42, "campaign_name": "Q3 SaaS founders", "platform": "instantly",
            "emails_sent": 1200, "replies": 30, "positive_replies": 9, "bounced": 12,
            "leads_count": 600, "created_at": "2024-03-02T09:15:00+00:00"}"#;
        let record: CampaignRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.campaign_id, None);
        assert!(record.created_at.is_some());
    }
}
