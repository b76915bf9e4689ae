//! `outreach-dashboard range`: the persisted date filter from the command line.

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use clap::Subcommand;
use outreach_core::config::AppConfig;
use outreach_core::{
    DatePreset, DateRange, DateRangeWithPreset, FilterStateRepository, JsonFileStore,
};
use serde::Serialize;

#[derive(Subcommand, Debug)]
pub enum RangeAction {
    /// Print the persisted filter (named presets recomputed for today)
    Show,
    /// Resolve a preset without saving it
    Resolve {
        /// 30d, mtd, ytd, 1y, 3y or 5y
        preset: DatePreset,
    },
    /// Select a preset and persist it
    Set { preset: DatePreset },
    /// Pick explicit dates; snaps to a preset when the dates match one
    Custom {
        /// First day, YYYY-MM-DD
        #[arg(long)]
        start: NaiveDate,
        /// Last day, YYYY-MM-DD
        #[arg(long)]
        end: NaiveDate,
        /// Print the result without saving it
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Forget the persisted filter
    Clear,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RangeView {
    preset: DatePreset,
    label: &'static str,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    /// Calendar dates as sent to the analytics endpoints.
    local_start: Option<NaiveDate>,
    local_end: Option<NaiveDate>,
    timezone: String,
}

impl RangeView {
    fn new(state: &DateRangeWithPreset, tz: &Tz) -> Self {
        let (local_start, local_end) = state.range.local_dates(tz);
        Self {
            preset: state.preset,
            label: state.preset.label(),
            start_date: state.range.start_date,
            end_date: state.range.end_date,
            local_start,
            local_end,
            timezone: tz.name().to_string(),
        }
    }
}

/// `start` at local midnight through the end of `end`, capped at `now`.
fn picked_range(
    start: NaiveDate,
    end: NaiveDate,
    now: &DateTime<Tz>,
) -> anyhow::Result<DateRange> {
    let today = now.date_naive();
    if start > today {
        anyhow::bail!("start date {start} is in the future (today is {today})");
    }
    if start > end {
        anyhow::bail!("start date {start} is after end date {end}");
    }
    let tz = now.timezone();
    let start_at = tz
        .from_local_datetime(&start.and_time(NaiveTime::MIN))
        .earliest()
        .with_context(|| format!("{start} has no local midnight in {}", tz.name()))?;
    let end_of_day = end
        .and_hms_opt(23, 59, 59)
        .and_then(|t| tz.from_local_datetime(&t).latest())
        .with_context(|| format!("{end} has no end of day in {}", tz.name()))?;
    let end_at = end_of_day.min(*now);

    Ok(DateRange::new(
        Some(start_at.with_timezone(&Utc)),
        Some(end_at.with_timezone(&Utc)),
    )?)
}

fn print(state: &DateRangeWithPreset, tz: &Tz) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&RangeView::new(state, tz))?);
    Ok(())
}

pub fn run(action: RangeAction, config: &AppConfig) -> anyhow::Result<()> {
    let tz = config.dashboard.tz()?;
    let now = Utc::now().with_timezone(&tz);
    let repository = FilterStateRepository::new(JsonFileStore::new(
        config.dashboard.filter_state_path.clone(),
    ));

    match action {
        RangeAction::Show => print(&repository.load(&now), &tz),
        RangeAction::Resolve { preset } => {
            print(&DateRangeWithPreset::from_preset(preset, &now), &tz)
        }
        RangeAction::Set { preset } => {
            if preset == DatePreset::Custom {
                anyhow::bail!("use `range custom --start .. --end ..` for a custom range");
            }
            let state = DateRangeWithPreset::from_preset(preset, &now);
            repository.save(&state)?;
            print(&state, &tz)
        }
        RangeAction::Custom {
            start,
            end,
            dry_run,
        } => {
            let previous = repository.load(&now).preset;
            let state =
                DateRangeWithPreset::from_range(picked_range(start, end, &now)?, &now, previous);
            if !dry_run {
                repository.save(&state)?;
            }
            print(&state, &tz)
        }
        RangeAction::Clear => {
            repository.clear()?;
            print(&DateRangeWithPreset::default_at(&now), &tz)
        }
    }
}
