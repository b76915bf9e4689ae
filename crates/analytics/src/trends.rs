//! Daily time series.

use crate::rates::count_rate;
use chrono::{Days, NaiveDate};
use outreach_backend::records::{DailyTrendRecord, SendVolumeRecord};
use outreach_core::types::{DailyTrendPoint, SendVolumePoint};
use std::collections::BTreeMap;

/// Longest window that is zero-filled; wider windows only list days with data.
pub const MAX_FILL_DAYS: i64 = 3660;

#[derive(Default, Clone, Copy)]
struct Volume {
    sent: i64,
    replies: i64,
    bounces: i64,
}

/// Sum rows per day across platforms. With both bounds set, every day of the
/// window is present (zero when idle) and rows outside it are dropped.
pub fn send_volume_series(
    rows: &[SendVolumeRecord],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<SendVolumePoint> {
    let mut by_day: BTreeMap<NaiveDate, Volume> = BTreeMap::new();

    if let (Some(start), Some(end)) = (start, end) {
        if start <= end && (end - start).num_days() <= MAX_FILL_DAYS {
            let mut day = start;
            while day <= end {
                by_day.insert(day, Volume::default());
                match day.checked_add_days(Days::new(1)) {
                    Some(next) => day = next,
                    None => break,
                }
            }
        }
    }

    for row in rows {
        if start.is_some_and(|s| row.date < s) || end.is_some_and(|e| row.date > e) {
            continue;
        }
        let entry = by_day.entry(row.date).or_default();
        entry.sent += row.emails_sent;
        entry.replies += row.replies;
        entry.bounces += row.bounces;
    }

    by_day
        .into_iter()
        .map(|(date, v)| SendVolumePoint {
            date,
            emails_sent: v.sent,
            replies: v.replies,
            bounces: v.bounces,
            reply_rate: count_rate(v.replies, v.sent),
        })
        .collect()
}

pub fn daily_trend_points(rows: Vec<DailyTrendRecord>) -> Vec<DailyTrendPoint> {
    let mut points: Vec<DailyTrendPoint> = rows
        .into_iter()
        .map(|r| DailyTrendPoint {
            date: r.date,
            emails_sent: r.emails_sent,
            replies: r.replies,
            positive_replies: r.positive_replies,
            bounces: r.bounces,
        })
        .collect();
    points.sort_by_key(|p| p.date);
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn row(d: u32, platform: &str, sent: i64, replies: i64) -> SendVolumeRecord {
        SendVolumeRecord {
            date: day(d),
            platform: Some(platform.to_string()),
            emails_sent: sent,
            replies,
            bounces: 1,
        }
    }

    #[test]
    fn test_platforms_summed_and_window_zero_filled() {
        let rows = vec![
            row(2, "instantly", 100, 5),
            row(2, "smartlead", 100, 3),
            row(4, "instantly", 50, 0),
            row(9, "instantly", 999, 9),
        ];
        let series = send_volume_series(&rows, Some(day(1)), Some(day(5)));
        assert_eq!(series.len(), 5);
        assert_eq!(series[0].emails_sent, 0);
        assert_eq!(series[0].reply_rate, 0.0);
        assert_eq!(series[1].emails_sent, 200);
        assert_eq!(series[1].replies, 8);
        assert_eq!(series[1].bounces, 2);
        assert_eq!(series[1].reply_rate, 4.0);
        assert_eq!(series[3].emails_sent, 50);
    }

    #[test]
    fn test_unbounded_lists_only_days_with_data() {
        let rows = vec![row(9, "instantly", 10, 1), row(2, "instantly", 10, 1)];
        let series = send_volume_series(&rows, None, None);
        assert_eq!(
            series.iter().map(|p| p.date).collect::<Vec<_>>(),
            vec![day(2), day(9)]
        );
    }

    #[test]
    fn test_daily_trends_sorted_by_date() {
        let points = daily_trend_points(vec![
            DailyTrendRecord {
                date: day(3),
                emails_sent: 1,
                replies: 0,
                positive_replies: 0,
                bounces: 0,
            },
            DailyTrendRecord {
                date: day(1),
                emails_sent: 2,
                replies: 1,
                positive_replies: 1,
                bounces: 0,
            },
        ]);
        assert_eq!(points[0].date, day(1));
        assert_eq!(points[1].emails_sent, 1);
    }
}
