//! Fixture-backed implementation of the backend traits.
//!
//! Serves local development (`backend.kind = "fixture"`) and the HTTP tests.
//! Aggregates are returned as stored; only the per-day series are clipped to
//! the requested window.

use crate::error::{BackendError, BackendResult};
use crate::records::*;
use crate::source::{AnalyticsBackend, CampaignFilter, ClientSource, StatsFilter};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureData {
    #[serde(default)]
    pub clients: Vec<ClientRecord>,
    #[serde(default)]
    pub client_statistics: Vec<ClientStatsRecord>,
    #[serde(default)]
    pub campaigns: Vec<CampaignRecord>,
    /// Platform performance rows keyed by platform name.
    #[serde(default)]
    pub platform_performance: HashMap<String, Vec<PlatformPerformanceRecord>>,
    /// Platforms whose performance call fails, to exercise partial results.
    #[serde(default)]
    pub unavailable_platforms: Vec<String>,
    #[serde(default)]
    pub send_volume: Vec<SendVolumeRecord>,
    #[serde(default)]
    pub kpi_totals: KpiTotalsRecord,
    #[serde(default)]
    pub replies: Vec<ReplyRecord>,
    /// Daily trend rows keyed by client id.
    #[serde(default)]
    pub daily_trends: HashMap<i64, Vec<DailyTrendRecord>>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    data: FixtureData,
}

impl MemoryBackend {
    pub fn new(data: FixtureData) -> Self {
        Self { data }
    }

    pub fn from_json_file(path: &Path) -> BackendResult<Self> {
        let source_name = path.display().to_string();
        let text = std::fs::read_to_string(path)
            .map_err(|e| BackendError::Unavailable(format!("fixture {source_name}: {e}")))?;
        let data = serde_json::from_str(&text)
            .map_err(|e| BackendError::decode(source_name, e.to_string()))?;
        Ok(Self::new(data))
    }
}

fn within(date: NaiveDate, filter: &StatsFilter) -> bool {
    filter.start_date.map_or(true, |start| date >= start)
        && filter.end_date.map_or(true, |end| date <= end)
}

fn same_text(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

#[async_trait]
impl ClientSource for MemoryBackend {
    fn name(&self) -> &'static str {
        "fixture"
    }

    async fn client_statistics(
        &self,
        filter: &StatsFilter,
    ) -> BackendResult<Vec<ClientStatsRecord>> {
        Ok(self
            .data
            .client_statistics
            .iter()
            .filter(|row| filter.client_id.map_or(true, |id| row.client_id == id))
            .cloned()
            .collect())
    }

    async fn clients(&self, client_id: Option<i64>) -> BackendResult<Vec<ClientRecord>> {
        Ok(self
            .data
            .clients
            .iter()
            .filter(|row| client_id.map_or(true, |id| row.id == id))
            .cloned()
            .collect())
    }

    async fn ping(&self) -> BackendResult<()> {
        Ok(())
    }
}

#[async_trait]
impl AnalyticsBackend for MemoryBackend {
    async fn campaigns(&self, filter: &CampaignFilter) -> BackendResult<Vec<CampaignRecord>> {
        Ok(self
            .data
            .campaigns
            .iter()
            .filter(|c| {
                filter
                    .status
                    .as_deref()
                    .map_or(true, |s| c.status.as_deref().is_some_and(|cs| same_text(cs, s)))
            })
            .filter(|c| {
                filter
                    .platform
                    .as_deref()
                    .map_or(true, |p| same_text(&c.platform, p))
            })
            .filter(|c| filter.client_id.map_or(true, |id| c.client_id == Some(id)))
            .cloned()
            .collect())
    }

    async fn campaign_by_external_id(
        &self,
        campaign_id: &str,
    ) -> BackendResult<Option<CampaignRecord>> {
        Ok(self
            .data
            .campaigns
            .iter()
            .find(|c| c.campaign_id.as_deref() == Some(campaign_id))
            .cloned())
    }

    async fn campaign_by_id(&self, id: i64) -> BackendResult<Option<CampaignRecord>> {
        Ok(self.data.campaigns.iter().find(|c| c.id == id).cloned())
    }

    async fn platform_performance(
        &self,
        platform: &str,
        _filter: &StatsFilter,
    ) -> BackendResult<Vec<PlatformPerformanceRecord>> {
        if self
            .data
            .unavailable_platforms
            .iter()
            .any(|p| same_text(p, platform))
        {
            return Err(BackendError::Unavailable(format!(
                "{platform} performance"
            )));
        }
        Ok(self
            .data
            .platform_performance
            .get(platform)
            .cloned()
            .unwrap_or_default())
    }

    async fn send_volume_trends(
        &self,
        filter: &StatsFilter,
    ) -> BackendResult<Vec<SendVolumeRecord>> {
        Ok(self
            .data
            .send_volume
            .iter()
            .filter(|row| within(row.date, filter))
            .filter(|row| match (&filter.platform, &row.platform) {
                (Some(wanted), Some(actual)) => same_text(wanted, actual),
                _ => true,
            })
            .cloned()
            .collect())
    }

    async fn kpi_totals(&self, _filter: &StatsFilter) -> BackendResult<KpiTotalsRecord> {
        Ok(self.data.kpi_totals.clone())
    }

    async fn recent_replies(
        &self,
        client_id: i64,
        limit: usize,
    ) -> BackendResult<Vec<ReplyRecord>> {
        let mut replies: Vec<ReplyRecord> = self
            .data
            .replies
            .iter()
            .filter(|r| r.client_id == Some(client_id))
            .cloned()
            .collect();
        replies.sort_by(|a, b| b.received_at.cmp(&a.received_at));
        replies.truncate(limit);
        Ok(replies)
    }

    async fn client_daily_trends(
        &self,
        client_id: i64,
        filter: &StatsFilter,
    ) -> BackendResult<Vec<DailyTrendRecord>> {
        Ok(self
            .data
            .daily_trends
            .get(&client_id)
            .map(|rows| {
                rows.iter()
                    .filter(|row| within(row.date, filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
