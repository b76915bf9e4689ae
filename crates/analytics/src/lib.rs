//! Statistics aggregation for the outreach dashboard: joins, derived rates,
//! search, sort, pagination and concurrent multi-source fetches.

#![warn(clippy::unwrap_used)]

pub mod campaigns;
pub mod client_detail;
pub mod clients;
pub mod fanout;
pub mod kpi;
pub mod lookup;
pub mod platform;
pub mod query;
pub mod rates;
pub mod trends;

pub use campaigns::{campaign_row, CampaignSortKey};
pub use client_detail::client_detail;
pub use clients::{client_row, merge_client_rows, ClientSortKey};
pub use fanout::{fan_in, fan_out, FanIn, SourceFailure, SourceOutcome};
pub use kpi::{kpi_overview, kpi_tiles, MetricTotals};
pub use lookup::{resolve_campaign, LookupStrategy};
pub use query::{filter_by_search, paginate, sort_rows, PageRequest, SortOrder, SortSpec};
pub use rates::{count_rate, safe_rate, safe_ratio};
