//! Headline metrics: the KPI overview and the nine detail-page tiles.

use crate::rates::{count_rate, safe_ratio};
use outreach_backend::records::KpiTotalsRecord;
use outreach_core::types::{CampaignRow, ClientStatRow, KpiOverview, KpiTile, TileFormat};

/// Raw counts every tile set is derived from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricTotals {
    pub emails_sent: i64,
    pub unique_leads: i64,
    pub replies: i64,
    pub positive_replies: i64,
    pub bounces: i64,
}

impl MetricTotals {
    pub fn reply_rate(&self) -> f64 {
        count_rate(self.replies, self.emails_sent)
    }

    pub fn positive_rate(&self) -> f64 {
        count_rate(self.positive_replies, self.replies)
    }

    pub fn bounce_rate(&self) -> f64 {
        count_rate(self.bounces, self.emails_sent)
    }

    /// Emails sent per positive reply; 0 when nothing was positive.
    pub fn sends_per_positive(&self) -> f64 {
        safe_ratio(self.emails_sent as f64, self.positive_replies as f64)
    }
}

impl From<&KpiTotalsRecord> for MetricTotals {
    fn from(record: &KpiTotalsRecord) -> Self {
        Self {
            emails_sent: record.total_emails_sent,
            unique_leads: record.unique_leads_connected,
            replies: record.total_replies,
            positive_replies: record.positive_replies,
            bounces: record.total_bounce,
        }
    }
}

impl From<&CampaignRow> for MetricTotals {
    fn from(row: &CampaignRow) -> Self {
        Self {
            emails_sent: row.emails_sent,
            unique_leads: row.leads_count,
            replies: row.replies,
            positive_replies: row.positive_replies,
            bounces: row.bounces,
        }
    }
}

impl From<&ClientStatRow> for MetricTotals {
    fn from(row: &ClientStatRow) -> Self {
        Self {
            emails_sent: row.emails_sent,
            unique_leads: row.unique_leads,
            replies: row.replies,
            positive_replies: row.positive_replies,
            bounces: row.bounces,
        }
    }
}

pub fn kpi_overview(record: &KpiTotalsRecord) -> KpiOverview {
    let totals = MetricTotals::from(record);
    KpiOverview {
        total_emails_sent: totals.emails_sent,
        unique_leads_connected: totals.unique_leads,
        total_replies: totals.replies,
        reply_rate: totals.reply_rate(),
        total_bounce: totals.bounces,
        bounce_rate: totals.bounce_rate(),
        positive_replies: totals.positive_replies,
        positive_replies_rate: totals.positive_rate(),
        send_positive_ratio: totals.sends_per_positive(),
    }
}

fn tile(key: &str, label: &str, value: f64, format: TileFormat) -> KpiTile {
    KpiTile {
        key: key.to_string(),
        label: label.to_string(),
        value,
        format,
    }
}

/// The fixed nine tiles, always in the same order.
pub fn kpi_tiles(totals: &MetricTotals) -> Vec<KpiTile> {
    use TileFormat::*;
    vec![
        tile("emailsSent", "Emails Sent", totals.emails_sent as f64, Number),
        tile("uniqueLeads", "Unique Leads", totals.unique_leads as f64, Number),
        tile("replies", "Replies", totals.replies as f64, Number),
        tile("replyRate", "Reply Rate", totals.reply_rate(), Percent),
        tile("positiveReplies", "Positive Replies", totals.positive_replies as f64, Number),
        tile("positiveRate", "Positive Rate", totals.positive_rate(), Percent),
        tile("bounces", "Bounces", totals.bounces as f64, Number),
        tile("bounceRate", "Bounce Rate", totals.bounce_rate(), Percent),
        tile(
            "sendsPerPositive",
            "Sends per Positive Reply",
            totals.sends_per_positive(),
            Ratio,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overview_derives_rates() {
        let overview = kpi_overview(&KpiTotalsRecord {
            total_emails_sent: 4000,
            unique_leads_connected: 1800,
            total_replies: 200,
            total_bounce: 80,
            positive_replies: 50,
        });
        assert_eq!(overview.reply_rate, 5.0);
        assert_eq!(overview.bounce_rate, 2.0);
        assert_eq!(overview.positive_replies_rate, 25.0);
        assert_eq!(overview.send_positive_ratio, 80.0);
    }

    #[test]
    fn test_empty_totals_are_all_zero() {
        let overview = kpi_overview(&KpiTotalsRecord::default());
        assert_eq!(overview, KpiOverview::default());
    }

    #[test]
    fn test_nine_tiles_in_fixed_order() {
        let tiles = kpi_tiles(&MetricTotals {
            emails_sent: 0,
            unique_leads: 0,
            replies: 0,
            positive_replies: 0,
            bounces: 0,
        });
        assert_eq!(tiles.len(), 9);
        assert_eq!(tiles[0].key, "emailsSent");
        assert_eq!(tiles[8].format, TileFormat::Ratio);
        assert!(tiles.iter().all(|t| t.value == 0.0));
    }
}
