#![warn(clippy::unwrap_used)]

pub mod config;
pub mod date_range;
pub mod error;
pub mod filter_state;
pub mod types;

pub use config::AppConfig;
pub use date_range::{DatePreset, DateRange, DateRangeWithPreset};
pub use error::{DashboardError, DashboardResult};
pub use filter_state::{FilterStateRepository, JsonFileStore, KeyValueStore, MemoryStore};
