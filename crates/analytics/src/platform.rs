//! Per-platform performance rows.

use crate::fanout::{fan_in, FanIn, SourceOutcome};
use crate::rates::count_rate;
use outreach_backend::records::PlatformPerformanceRecord;
use outreach_core::types::PlatformPerformanceRow;

pub fn platform_row(source: &str, record: &PlatformPerformanceRecord) -> PlatformPerformanceRow {
    PlatformPerformanceRow {
        platform: record
            .platform
            .clone()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| source.to_string()),
        total_sends: record.total_sends,
        total_replies: record.total_replies,
        reply_rate: count_rate(record.total_replies, record.total_sends),
        bounce_rate: count_rate(record.bounces, record.total_sends),
        total_leads: record.total_leads,
        positive_rate: count_rate(record.positive_replies, record.total_replies),
        campaign_count: record.campaign_count,
    }
}

/// Map each source's records to rows, then merge the outcomes.
pub fn platform_rows(
    outcomes: Vec<SourceOutcome<PlatformPerformanceRecord>>,
) -> FanIn<PlatformPerformanceRow> {
    let mapped = outcomes
        .into_iter()
        .map(|outcome| {
            let result = outcome
                .result
                .map(|records| records.iter().map(|r| platform_row(&outcome.source, r)).collect());
            SourceOutcome {
                source: outcome.source,
                result,
            }
        })
        .collect();
    fan_in(mapped)
}

/// Keep rows whose platform contains `filter`, ignoring case. No filter keeps
/// everything.
pub fn filter_platform(
    rows: Vec<PlatformPerformanceRow>,
    filter: Option<&str>,
) -> Vec<PlatformPerformanceRow> {
    match filter.map(str::trim).filter(|f| !f.is_empty()) {
        Some(wanted) => {
            let wanted = wanted.to_lowercase();
            rows.into_iter()
                .filter(|row| row.platform.to_lowercase().contains(&wanted))
                .collect()
        }
        None => rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outreach_backend::BackendError;

    fn record(platform: Option<&str>, sends: i64, replies: i64) -> PlatformPerformanceRecord {
        PlatformPerformanceRecord {
            platform: platform.map(str::to_string),
            total_sends: sends,
            total_replies: replies,
            positive_replies: replies / 4,
            bounces: sends / 50,
            total_leads: sends / 3,
            campaign_count: 4,
        }
    }

    #[test]
    fn test_one_source_failing_keeps_the_other() {
        let merged = platform_rows(vec![
            SourceOutcome {
                source: "instantly".to_string(),
                result: Ok(vec![record(None, 1000, 40)]),
            },
            SourceOutcome {
                source: "smartlead".to_string(),
                result: Err(BackendError::Unavailable("smartlead".to_string())),
            },
        ]);
        assert_eq!(merged.rows.len(), 1);
        assert_eq!(merged.rows[0].platform, "instantly");
        assert_eq!(merged.rows[0].reply_rate, 4.0);
        assert_eq!(merged.rows[0].positive_rate, 25.0);
        assert_eq!(merged.rows[0].bounce_rate, 2.0);
        assert_eq!(merged.failures[0].source, "smartlead");
    }

    #[test]
    fn test_platform_substring_filter() {
        let rows = vec![
            platform_row("instantly", &record(Some("Instantly"), 10, 1)),
            platform_row("smartlead", &record(Some("SmartLead"), 0, 0)),
        ];
        assert_eq!(filter_platform(rows.clone(), None).len(), 2);
        let hits = filter_platform(rows.clone(), Some("smart"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].platform, "SmartLead");
        assert_eq!(hits[0].reply_rate, 0.0);
        assert!(filter_platform(rows, Some("lemlist")).is_empty());
    }
}
