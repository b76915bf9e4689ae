//! Campaign detail lookup: external id first, then internal numeric id.

use outreach_backend::records::CampaignRecord;
use outreach_backend::{AnalyticsBackend, BackendResult};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStrategy {
    /// `campaign_id = input`
    ExternalId,
    /// `id = input`; only for all-digit input.
    NumericId,
}

impl LookupStrategy {
    pub const ORDER: [LookupStrategy; 2] = [LookupStrategy::ExternalId, LookupStrategy::NumericId];

    pub fn applies_to(self, input: &str) -> bool {
        match self {
            LookupStrategy::ExternalId => !input.is_empty(),
            LookupStrategy::NumericId => {
                !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit())
            }
        }
    }

    async fn fetch(
        self,
        backend: &dyn AnalyticsBackend,
        input: &str,
    ) -> BackendResult<Option<CampaignRecord>> {
        match self {
            LookupStrategy::ExternalId => backend.campaign_by_external_id(input).await,
            LookupStrategy::NumericId => match input.parse::<i64>() {
                Ok(id) => backend.campaign_by_id(id).await,
                // too many digits for an id
                Err(_) => Ok(None),
            },
        }
    }
}

/// Try each applicable strategy in order; the first hit wins.
pub async fn resolve_campaign(
    backend: &dyn AnalyticsBackend,
    input: &str,
) -> BackendResult<Option<CampaignRecord>> {
    for strategy in LookupStrategy::ORDER {
        if !strategy.applies_to(input) {
            continue;
        }
        if let Some(record) = strategy.fetch(backend, input).await? {
            debug!(input, ?strategy, campaign = record.id, "Campaign resolved");
            return Ok(Some(record));
        }
    }
    Ok(None)
}
