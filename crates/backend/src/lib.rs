//! Data sources for the analytics endpoints.
//!
//! Every backend call decodes into an explicit record type from [`records`];
//! rows of an unexpected shape surface as [`BackendError::Decode`] instead of
//! being zero-filled.

#![warn(clippy::unwrap_used)]

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod source;
pub mod supabase;

pub use error::{BackendError, BackendResult};
pub use memory::{FixtureData, MemoryBackend};
pub use postgres::PgDirectBackend;
pub use source::{AnalyticsBackend, CampaignFilter, ClientSource, StatsFilter};
pub use supabase::SupabaseBackend;
