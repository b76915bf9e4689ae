//! Campaign list rows.

use crate::query::{Searchable, SortKey, SortOrder, SortValue, Sortable};
use crate::rates::count_rate;
use outreach_backend::records::CampaignRecord;
use outreach_core::types::CampaignRow;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CampaignSortKey {
    #[default]
    CreatedAt,
    UpdatedAt,
    CampaignName,
    ClientName,
    Platform,
    Status,
    EmailsSent,
    Replies,
    PositiveReplies,
    ReplyRate,
    PositiveRate,
    BounceRate,
    LeadsCount,
}

impl SortKey for CampaignSortKey {
    const FIELDS: &'static [(&'static str, Self)] = &[
        ("created_at", CampaignSortKey::CreatedAt),
        ("updated_at", CampaignSortKey::UpdatedAt),
        ("campaign_name", CampaignSortKey::CampaignName),
        ("name", CampaignSortKey::CampaignName),
        ("client_name", CampaignSortKey::ClientName),
        ("platform", CampaignSortKey::Platform),
        ("status", CampaignSortKey::Status),
        ("emails_sent", CampaignSortKey::EmailsSent),
        ("replies", CampaignSortKey::Replies),
        ("positive_replies", CampaignSortKey::PositiveReplies),
        ("reply_rate", CampaignSortKey::ReplyRate),
        ("positive_rate", CampaignSortKey::PositiveRate),
        ("bounce_rate", CampaignSortKey::BounceRate),
        ("leads_count", CampaignSortKey::LeadsCount),
    ];

    fn default_order(self) -> SortOrder {
        match self {
            CampaignSortKey::CampaignName
            | CampaignSortKey::ClientName
            | CampaignSortKey::Platform
            | CampaignSortKey::Status => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }
}

impl Sortable for CampaignRow {
    type Key = CampaignSortKey;

    fn sort_value(&self, key: CampaignSortKey) -> SortValue<'_> {
        use CampaignSortKey::*;
        match key {
            CreatedAt => SortValue::Timestamp(self.created_at),
            UpdatedAt => SortValue::Timestamp(self.updated_at),
            CampaignName => SortValue::Text(&self.campaign_name),
            ClientName => SortValue::Text(&self.client_name),
            Platform => SortValue::Text(&self.platform),
            Status => SortValue::Text(&self.status),
            EmailsSent => SortValue::Number(self.emails_sent as f64),
            Replies => SortValue::Number(self.replies as f64),
            PositiveReplies => SortValue::Number(self.positive_replies as f64),
            ReplyRate => SortValue::Number(self.reply_rate),
            PositiveRate => SortValue::Number(self.positive_rate),
            BounceRate => SortValue::Number(self.bounce_rate),
            LeadsCount => SortValue::Number(self.leads_count as f64),
        }
    }

    fn tie_breaker(&self) -> i64 {
        self.id
    }
}

impl Searchable for CampaignRow {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            &self.campaign_name,
            &self.campaign_id,
            &self.client_name,
            &self.platform,
        ]
    }
}

pub fn campaign_row(record: CampaignRecord) -> CampaignRow {
    CampaignRow {
        id: record.id,
        campaign_id: record.campaign_id.unwrap_or_default(),
        campaign_name: record.campaign_name,
        client_id: record.client_id,
        client_name: record.client_name.unwrap_or_default(),
        platform: record.platform,
        status: record.status.unwrap_or_default(),
        emails_sent: record.emails_sent,
        replies: record.replies,
        positive_replies: record.positive_replies,
        bounces: record.bounced,
        leads_count: record.leads_count,
        reply_rate: count_rate(record.replies, record.emails_sent),
        positive_rate: count_rate(record.positive_replies, record.replies),
        bounce_rate: count_rate(record.bounced, record.emails_sent),
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::{TimeZone, Utc};

    pub fn record(id: i64, platform: &str, sent: i64, replies: i64) -> CampaignRecord {
        CampaignRecord {
            id,
            campaign_id: Some(format!("cmp_{id:04}")),
            campaign_name: format!("Campaign {id}"),
            client_id: Some(7),
            client_name: Some("Acme".to_string()),
            platform: platform.to_string(),
            status: Some("active".to_string()),
            emails_sent: sent,
            replies,
            positive_replies: replies / 3,
            bounced: sent / 100,
            leads_count: sent / 2,
            created_at: Some(Utc.with_ymd_and_hms(2024, 3, id as u32, 9, 0, 0).unwrap()),
            updated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::record;
    use super::*;
    use crate::query::{sort_rows, SortSpec};

    #[test]
    fn test_rates_are_derived_and_zero_safe() {
        let row = campaign_row(record(1, "instantly", 200, 30));
        assert_eq!(row.reply_rate, 15.0);
        assert!((row.positive_rate - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(row.bounce_rate, 1.0);
        assert_eq!(row.bounces, 2);

        let idle = campaign_row(record(2, "instantly", 0, 0));
        assert_eq!(idle.reply_rate, 0.0);
        assert_eq!(idle.positive_rate, 0.0);
        assert_eq!(idle.bounce_rate, 0.0);
    }

    #[test]
    fn test_missing_text_becomes_blank() {
        let mut raw = record(3, "smartlead", 10, 1);
        raw.campaign_id = None;
        raw.status = None;
        let row = campaign_row(raw);
        assert_eq!(row.campaign_id, "");
        assert_eq!(row.status, "");
    }

    #[test]
    fn test_default_sort_is_newest_first() {
        let mut rows: Vec<_> = [3, 1, 2]
            .into_iter()
            .map(|id| campaign_row(record(id, "instantly", 10, 1)))
            .collect();
        sort_rows(&mut rows, SortSpec::default());
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3, 2, 1]);
    }
}
