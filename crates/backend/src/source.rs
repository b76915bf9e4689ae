use crate::error::BackendResult;
use crate::records::*;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Filters shared by the statistics RPCs. `None` fields are omitted from the
/// call so the backend applies its own defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub platform: Option<String>,
    pub client_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CampaignFilter {
    pub status: Option<String>,
    pub platform: Option<String>,
    pub client_id: Option<i64>,
}

/// The calls needed to build the client list.
#[async_trait]
pub trait ClientSource: Send + Sync + 'static {
    /// Short name used in logs and metrics labels.
    fn name(&self) -> &'static str;

    async fn client_statistics(&self, filter: &StatsFilter)
        -> BackendResult<Vec<ClientStatsRecord>>;

    /// Client master rows; `Some(id)` restricts to that client.
    async fn clients(&self, client_id: Option<i64>) -> BackendResult<Vec<ClientRecord>>;

    /// Liveness check against the source.
    async fn ping(&self) -> BackendResult<()>;
}

/// Full analytics backend.
#[async_trait]
pub trait AnalyticsBackend: ClientSource {
    async fn campaigns(&self, filter: &CampaignFilter) -> BackendResult<Vec<CampaignRecord>>;

    async fn campaign_by_external_id(
        &self,
        campaign_id: &str,
    ) -> BackendResult<Option<CampaignRecord>>;

    async fn campaign_by_id(&self, id: i64) -> BackendResult<Option<CampaignRecord>>;

    async fn platform_performance(
        &self,
        platform: &str,
        filter: &StatsFilter,
    ) -> BackendResult<Vec<PlatformPerformanceRecord>>;

    async fn send_volume_trends(&self, filter: &StatsFilter)
        -> BackendResult<Vec<SendVolumeRecord>>;

    async fn kpi_totals(&self, filter: &StatsFilter) -> BackendResult<KpiTotalsRecord>;

    async fn recent_replies(&self, client_id: i64, limit: usize)
        -> BackendResult<Vec<ReplyRecord>>;

    async fn client_daily_trends(
        &self,
        client_id: i64,
        filter: &StatsFilter,
    ) -> BackendResult<Vec<DailyTrendRecord>>;
}
