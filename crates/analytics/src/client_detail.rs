//! Assembly of the single-client detail page.

use crate::kpi::{kpi_tiles, MetricTotals};
use crate::rates::count_rate;
use outreach_backend::records::ReplyRecord;
use outreach_core::types::{
    ActivityEntry, ActivityKind, CampaignRow, ClientDetail, ClientStatRow, DailyTrendPoint,
    PlatformBreakdown, ReplySummary,
};
use std::collections::BTreeMap;

pub const RECENT_REPLY_LIMIT: usize = 10;
pub const ACTIVITY_LIMIT: usize = 20;

/// Campaigns grouped by platform, platforms in name order.
pub fn platform_breakdown(campaigns: &[CampaignRow]) -> Vec<PlatformBreakdown> {
    let mut groups: BTreeMap<String, PlatformBreakdown> = BTreeMap::new();
    for c in campaigns {
        let key = c.platform.to_lowercase();
        let group = groups.entry(key).or_insert_with(|| PlatformBreakdown {
            platform: c.platform.clone(),
            campaigns: 0,
            emails_sent: 0,
            replies: 0,
            positive_replies: 0,
            reply_rate: 0.0,
        });
        group.campaigns += 1;
        group.emails_sent += c.emails_sent;
        group.replies += c.replies;
        group.positive_replies += c.positive_replies;
    }
    groups
        .into_values()
        .map(|mut g| {
            g.reply_rate = count_rate(g.replies, g.emails_sent);
            g
        })
        .collect()
}

pub fn reply_summaries(replies: Vec<ReplyRecord>) -> Vec<ReplySummary> {
    replies
        .into_iter()
        .map(|r| ReplySummary {
            id: r.id,
            campaign_id: r.campaign_id,
            lead_email: r.lead_email,
            category: r.category.unwrap_or_else(|| "uncategorized".to_string()),
            is_positive: r.is_positive,
            received_at: r.received_at,
        })
        .collect()
}

/// Campaign launches and replies merged newest first, at most `limit`.
pub fn activity_feed(
    campaigns: &[CampaignRow],
    replies: &[ReplySummary],
    limit: usize,
) -> Vec<ActivityEntry> {
    let launches = campaigns.iter().filter_map(|c| {
        c.created_at.map(|at| ActivityEntry {
            kind: ActivityKind::CampaignLaunched,
            title: format!("Campaign \"{}\" launched on {}", c.campaign_name, c.platform),
            occurred_at: at,
        })
    });
    let received = replies.iter().map(|r| ActivityEntry {
        kind: ActivityKind::ReplyReceived,
        title: if r.is_positive {
            format!("Positive reply from {}", r.lead_email)
        } else {
            format!("Reply from {}", r.lead_email)
        },
        occurred_at: r.received_at,
    });

    let mut feed: Vec<ActivityEntry> = launches.chain(received).collect();
    feed.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
    feed.truncate(limit);
    feed
}

pub fn client_detail(
    client: ClientStatRow,
    campaigns: Vec<CampaignRow>,
    replies: Vec<ReplyRecord>,
    daily_trends: Vec<DailyTrendPoint>,
) -> ClientDetail {
    let recent_replies = reply_summaries(replies);
    ClientDetail {
        kpi_data: kpi_tiles(&MetricTotals::from(&client)),
        platform_breakdown: platform_breakdown(&campaigns),
        activity: activity_feed(&campaigns, &recent_replies, ACTIVITY_LIMIT),
        client,
        campaigns,
        recent_replies,
        daily_trends,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaigns::{campaign_row, fixtures::record};
    use crate::clients::client_row;
    use chrono::{TimeZone, Utc};

    fn reply(id: i64, day: u32, positive: bool) -> ReplyRecord {
        ReplyRecord {
            id,
            client_id: Some(7),
            campaign_id: Some("cmp_0001".to_string()),
            lead_email: format!("lead{id}@example.com"),
            category: None,
            is_positive: positive,
            received_at: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_breakdown_groups_by_platform() {
        let campaigns = vec![
            campaign_row(record(1, "instantly", 100, 10)),
            campaign_row(record(2, "smartlead", 50, 0)),
            campaign_row(record(3, "Instantly", 100, 0)),
        ];
        let groups = platform_breakdown(&campaigns);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].platform, "instantly");
        assert_eq!(groups[0].campaigns, 2);
        assert_eq!(groups[0].emails_sent, 200);
        assert_eq!(groups[0].reply_rate, 5.0);
        assert_eq!(groups[1].reply_rate, 0.0);
    }

    #[test]
    fn test_activity_is_newest_first_and_limited() {
        let campaigns = vec![
            campaign_row(record(1, "instantly", 10, 1)),
            campaign_row(record(4, "instantly", 10, 1)),
        ];
        let replies = reply_summaries(vec![reply(1, 2, true), reply(2, 6, false)]);
        let feed = activity_feed(&campaigns, &replies, 3);
        assert_eq!(feed.len(), 3);
        assert_eq!(feed[0].kind, ActivityKind::ReplyReceived);
        assert_eq!(feed[1].kind, ActivityKind::CampaignLaunched);
        assert!(feed[2].title.starts_with("Positive reply"));
    }

    #[test]
    fn test_detail_assembles_all_sections() {
        let client = client_row(7, None, None);
        let detail = client_detail(
            client,
            vec![campaign_row(record(1, "instantly", 10, 1))],
            vec![reply(1, 2, false)],
            Vec::new(),
        );
        assert_eq!(detail.kpi_data.len(), 9);
        assert_eq!(detail.recent_replies[0].category, "uncategorized");
        assert_eq!(detail.activity.len(), 2);
        assert_eq!(detail.platform_breakdown.len(), 1);
    }
}
