//! Date range presets and their reconciliation with arbitrary ranges.
//!
//! A preset (`30d`, `mtd`, `ytd`, `1y`, `3y`, `5y`) resolves to a concrete
//! `[start, end]` pair relative to "now" in the dashboard timezone. The
//! inverse direction snaps a hand-picked range back to a preset when its
//! local-midnight-truncated bounds coincide with one.

use crate::error::{DashboardError, DashboardResult};
use chrono::{
    DateTime, Datelike, Days, Duration, LocalResult, Months, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Utc,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum DatePreset {
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "mtd")]
    MonthToDate,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "1y")]
    LastYear,
    #[serde(rename = "3y")]
    LastThreeYears,
    #[serde(rename = "5y")]
    LastFiveYears,
    #[serde(rename = "custom")]
    Custom,
}

impl DatePreset {
    /// Priority order used when snapping a range back to a preset.
    pub const MATCH_ORDER: [DatePreset; 6] = [
        DatePreset::Last30Days,
        DatePreset::MonthToDate,
        DatePreset::YearToDate,
        DatePreset::LastYear,
        DatePreset::LastThreeYears,
        DatePreset::LastFiveYears,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatePreset::Last30Days => "30d",
            DatePreset::MonthToDate => "mtd",
            DatePreset::YearToDate => "ytd",
            DatePreset::LastYear => "1y",
            DatePreset::LastThreeYears => "3y",
            DatePreset::LastFiveYears => "5y",
            DatePreset::Custom => "custom",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DatePreset::Last30Days => "Last 30 days",
            DatePreset::MonthToDate => "Month to date",
            DatePreset::YearToDate => "Year to date",
            DatePreset::LastYear => "Last year",
            DatePreset::LastThreeYears => "Last 3 years",
            DatePreset::LastFiveYears => "Last 5 years",
            DatePreset::Custom => "Custom range",
        }
    }

    fn years_back(&self) -> Option<u32> {
        match self {
            DatePreset::LastYear => Some(1),
            DatePreset::LastThreeYears => Some(3),
            DatePreset::LastFiveYears => Some(5),
            _ => None,
        }
    }
}

impl Default for DatePreset {
    fn default() -> Self {
        DatePreset::MonthToDate
    }
}

impl fmt::Display for DatePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatePreset {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "30d" => Ok(DatePreset::Last30Days),
            "mtd" => Ok(DatePreset::MonthToDate),
            "ytd" => Ok(DatePreset::YearToDate),
            "1y" => Ok(DatePreset::LastYear),
            "3y" => Ok(DatePreset::LastThreeYears),
            "5y" => Ok(DatePreset::LastFiveYears),
            "custom" => Ok(DatePreset::Custom),
            other => Err(DashboardError::Validation(format!(
                "unknown date preset '{other}'"
            ))),
        }
    }
}

/// A possibly-open date range. Both bounds set or both unset, except while a
/// custom range is being picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Build a range, rejecting a start after the end.
    pub fn new(
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> DashboardResult<Self> {
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(DashboardError::Validation(format!(
                    "start date {start} is after end date {end}"
                )));
            }
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }

    pub fn unset() -> Self {
        Self::default()
    }

    pub fn is_unset(&self) -> bool {
        self.start_date.is_none() && self.end_date.is_none()
    }

    pub fn is_complete(&self) -> bool {
        self.start_date.is_some() && self.end_date.is_some()
    }

    pub fn bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.start_date?, self.end_date?))
    }

    /// Calendar dates of the bounds in `tz`, as sent to the analytics API.
    pub fn local_dates<Tz: TimeZone>(&self, tz: &Tz) -> (Option<NaiveDate>, Option<NaiveDate>) {
        (
            self.start_date.map(|d| local_date(&d, tz)),
            self.end_date.map(|d| local_date(&d, tz)),
        )
    }
}

/// The dashboard's current date filter: a preset label plus its range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DateRangeWithPreset {
    pub preset: DatePreset,
    pub range: DateRange,
}

impl DateRangeWithPreset {
    pub fn from_preset<Tz: TimeZone>(preset: DatePreset, now: &DateTime<Tz>) -> Self {
        Self {
            preset,
            range: resolve_preset(preset, now),
        }
    }

    /// The filter used when nothing usable was persisted.
    pub fn default_at<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        Self::from_preset(DatePreset::default(), now)
    }

    /// Label a picked range, keeping `previous` if it still describes it.
    pub fn from_range<Tz: TimeZone>(
        range: DateRange,
        now: &DateTime<Tz>,
        previous: DatePreset,
    ) -> Self {
        Self {
            preset: reconcile(&range, now, previous),
            range,
        }
    }

    /// A custom selection needs both bounds before it can be applied.
    pub fn can_apply(&self) -> bool {
        match self.preset {
            DatePreset::Custom => self.range.is_complete(),
            _ => true,
        }
    }

    /// Recompute a named preset against `now`; custom ranges are kept.
    pub fn refreshed<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Self {
        match self.preset {
            DatePreset::Custom => *self,
            preset => Self::from_preset(preset, now),
        }
    }
}

/// Resolve a preset to its concrete range as of `now`.
pub fn resolve_preset<Tz: TimeZone>(preset: DatePreset, now: &DateTime<Tz>) -> DateRange {
    let end = now.with_timezone(&Utc);
    let tz = now.timezone();
    let start = match preset {
        DatePreset::Custom => return DateRange::unset(),
        DatePreset::Last30Days => days_before(now, 29),
        DatePreset::MonthToDate => now
            .date_naive()
            .with_day(1)
            .map(|first| local_midnight(&tz, first)),
        DatePreset::YearToDate => NaiveDate::from_ymd_opt(now.year(), 1, 1)
            .map(|first| local_midnight(&tz, first)),
        DatePreset::LastYear | DatePreset::LastThreeYears | DatePreset::LastFiveYears => {
            let years = preset.years_back().unwrap_or(1);
            years_before(now, years)
        }
    };

    DateRange {
        start_date: Some(start.unwrap_or(end)),
        end_date: Some(end),
    }
}

/// Find the first preset (in [`DatePreset::MATCH_ORDER`]) whose canonical
/// range has the same local-midnight bounds as `range`.
pub fn match_preset<Tz: TimeZone>(range: &DateRange, now: &DateTime<Tz>) -> DatePreset {
    let Some(candidate) = truncated(range, &now.timezone()) else {
        return DatePreset::Custom;
    };
    DatePreset::MATCH_ORDER
        .into_iter()
        .find(|preset| canonical_dates(*preset, now) == Some(candidate))
        .unwrap_or(DatePreset::Custom)
}

/// Like [`match_preset`], but prefers `previous` when it also matches. Presets
/// coincide on some days (`mtd` and `ytd` on January 1, `30d` and `mtd` on
/// the 30th), and the user's label must not flip on those days.
pub fn reconcile<Tz: TimeZone>(
    range: &DateRange,
    now: &DateTime<Tz>,
    previous: DatePreset,
) -> DatePreset {
    if previous != DatePreset::Custom {
        if let Some(candidate) = truncated(range, &now.timezone()) {
            if canonical_dates(previous, now) == Some(candidate) {
                return previous;
            }
        }
    }
    match_preset(range, now)
}

fn canonical_dates<Tz: TimeZone>(
    preset: DatePreset,
    now: &DateTime<Tz>,
) -> Option<(NaiveDate, NaiveDate)> {
    truncated(&resolve_preset(preset, now), &now.timezone())
}

fn truncated<Tz: TimeZone>(range: &DateRange, tz: &Tz) -> Option<(NaiveDate, NaiveDate)> {
    let (start, end) = range.bounds()?;
    Some((local_date(&start, tz), local_date(&end, tz)))
}

fn local_date<Tz: TimeZone>(instant: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// Midnight of `date` in `tz`. Where a DST transition skips midnight the
/// first valid instant after it is used.
fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| naive.and_utc()),
    }
}

/// Same wall-clock time N calendar days earlier.
fn days_before<Tz: TimeZone>(now: &DateTime<Tz>, days: u64) -> Option<DateTime<Utc>> {
    let days = Days::new(days);
    if let Some(dt) = now.clone().checked_sub_days(days) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = now.naive_local().checked_sub_days(days)?;
    nearest_local(&now.timezone(), naive)
}

/// Same wall-clock time N years earlier; Feb 29 clamps to Feb 28.
fn years_before<Tz: TimeZone>(now: &DateTime<Tz>, years: u32) -> Option<DateTime<Utc>> {
    let months = Months::new(years * 12);
    if let Some(dt) = now.clone().checked_sub_months(months) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = now.naive_local().checked_sub_months(months)?;
    nearest_local(&now.timezone(), naive)
}

/// `naive` in `tz`, or an hour later when it falls into a DST gap.
fn nearest_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_month_to_date_starts_at_local_midnight() {
        let now = utc(2024, 3, 15, 14, 30);
        let range = resolve_preset(DatePreset::MonthToDate, &now);
        assert_eq!(range.start_date, Some(utc(2024, 3, 1, 0, 0)));
        assert_eq!(range.end_date, Some(now));
    }

    #[test]
    fn test_last_30_days_includes_today() {
        let now = utc(2024, 3, 15, 9, 0);
        let range = resolve_preset(DatePreset::Last30Days, &now);
        assert_eq!(range.start_date, Some(utc(2024, 2, 15, 9, 0)));
        assert_eq!(range.end_date, Some(now));
    }

    #[test]
    fn test_last_30_days_counts_calendar_days_across_dst() {
        // 2024-03-10 is the spring-forward day in New York.
        let now = New_York.with_ymd_and_hms(2024, 4, 1, 0, 30, 0).unwrap();
        let range = resolve_preset(DatePreset::Last30Days, &now);
        assert_eq!(range.start_date, Some(utc(2024, 3, 3, 5, 30)));
        assert_eq!(
            range.local_dates(&New_York).0,
            NaiveDate::from_ymd_opt(2024, 3, 3)
        );

        let picked = DateRange::new(
            Some(New_York.with_ymd_and_hms(2024, 3, 3, 0, 0, 0).unwrap().with_timezone(&Utc)),
            Some(now.with_timezone(&Utc)),
        )
        .unwrap();
        assert_eq!(match_preset(&picked, &now), DatePreset::Last30Days);
    }

    #[test]
    fn test_year_to_date_and_years_back() {
        let now = utc(2024, 7, 4, 12, 0);
        let ytd = resolve_preset(DatePreset::YearToDate, &now);
        assert_eq!(ytd.start_date, Some(utc(2024, 1, 1, 0, 0)));

        let five = resolve_preset(DatePreset::LastFiveYears, &now);
        assert_eq!(five.start_date, Some(utc(2019, 7, 4, 12, 0)));
    }

    #[test]
    fn test_leap_day_clamps_to_feb_28() {
        let now = utc(2024, 2, 29, 8, 0);
        let range = resolve_preset(DatePreset::LastYear, &now);
        assert_eq!(range.start_date, Some(utc(2023, 2, 28, 8, 0)));
    }

    #[test]
    fn test_custom_resolves_to_unset() {
        let range = resolve_preset(DatePreset::Custom, &utc(2024, 3, 15, 0, 0));
        assert!(range.is_unset());
    }

    #[test]
    fn test_local_midnight_uses_dashboard_timezone() {
        let now = New_York.with_ymd_and_hms(2024, 3, 15, 1, 0, 0).unwrap();
        let range = resolve_preset(DatePreset::MonthToDate, &now);
        // March 1 is still EST (UTC-5).
        assert_eq!(range.start_date, Some(utc(2024, 3, 1, 5, 0)));
        assert_eq!(match_preset(&range, &now), DatePreset::MonthToDate);
    }

    #[test]
    fn test_missing_bound_matches_custom() {
        let now = utc(2024, 3, 15, 10, 0);
        let half = DateRange {
            start_date: Some(utc(2024, 3, 1, 0, 0)),
            end_date: None,
        };
        assert_eq!(match_preset(&half, &now), DatePreset::Custom);
        assert_eq!(match_preset(&DateRange::unset(), &now), DatePreset::Custom);
    }

    #[test]
    fn test_dragged_selection_snaps_to_preset() {
        let now = utc(2024, 3, 15, 10, 0);
        let picked = DateRange::new(Some(utc(2024, 2, 15, 13, 0)), Some(utc(2024, 3, 15, 8, 0)))
            .unwrap();
        assert_eq!(match_preset(&picked, &now), DatePreset::Last30Days);

        let arbitrary =
            DateRange::new(Some(utc(2024, 2, 10, 0, 0)), Some(utc(2024, 3, 12, 0, 0))).unwrap();
        assert_eq!(match_preset(&arbitrary, &now), DatePreset::Custom);
    }

    #[test]
    fn test_resolve_then_match_round_trips() {
        let mut day = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        while day <= last {
            let now = day.and_hms_opt(15, 45, 0).unwrap().and_utc();
            for preset in DatePreset::MATCH_ORDER {
                let range = resolve_preset(preset, &now);
                let matched = match_preset(&range, &now);
                // A different label is only allowed when both presets describe
                // the same local dates on this day.
                assert_eq!(
                    canonical_dates(matched, &now),
                    canonical_dates(preset, &now),
                    "{preset} on {day}"
                );
                assert_eq!(reconcile(&range, &now, preset), preset, "{preset} on {day}");
            }
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_coinciding_presets_use_priority_order() {
        let now = utc(2024, 1, 1, 9, 0);
        let ytd = resolve_preset(DatePreset::YearToDate, &now);
        assert_eq!(match_preset(&ytd, &now), DatePreset::MonthToDate);
        assert_eq!(
            reconcile(&ytd, &now, DatePreset::YearToDate),
            DatePreset::YearToDate
        );

        let now = utc(2024, 4, 30, 9, 0);
        let mtd = resolve_preset(DatePreset::MonthToDate, &now);
        assert_eq!(match_preset(&mtd, &now), DatePreset::Last30Days);
    }

    #[test]
    fn test_reversed_range_rejected() {
        let err = DateRange::new(Some(utc(2024, 3, 2, 0, 0)), Some(utc(2024, 3, 1, 0, 0)));
        assert!(matches!(err, Err(DashboardError::Validation(_))));
    }

    #[test]
    fn test_incomplete_custom_cannot_apply() {
        let now = utc(2024, 3, 15, 10, 0);
        let half = DateRange {
            start_date: Some(utc(2024, 3, 3, 0, 0)),
            end_date: None,
        };
        let state = DateRangeWithPreset::from_range(half, &now, DatePreset::Custom);
        assert_eq!(state.preset, DatePreset::Custom);
        assert!(!state.can_apply());
        assert!(DateRangeWithPreset::default_at(&now).can_apply());
    }

    #[test]
    fn test_refresh_recomputes_named_presets_only() {
        let then = utc(2024, 3, 15, 10, 0);
        let later = utc(2024, 5, 2, 10, 0);
        let mtd = DateRangeWithPreset::from_preset(DatePreset::MonthToDate, &then);
        assert_eq!(
            mtd.refreshed(&later).range.start_date,
            Some(utc(2024, 5, 1, 0, 0))
        );

        let custom = DateRangeWithPreset {
            preset: DatePreset::Custom,
            range: DateRange::new(Some(utc(2024, 1, 5, 0, 0)), Some(utc(2024, 1, 9, 0, 0)))
                .unwrap(),
        };
        assert_eq!(custom.refreshed(&later), custom);
    }

    #[test]
    fn test_preset_parsing() {
        assert_eq!("YTD".parse::<DatePreset>().unwrap(), DatePreset::YearToDate);
        assert_eq!(DatePreset::LastThreeYears.to_string(), "3y");
        assert!("2w".parse::<DatePreset>().is_err());
    }
}
