#![warn(clippy::unwrap_used)]

pub mod analytics_rest;
pub mod campaign_rest;
pub mod client_rest;
pub mod error;
pub mod params;
pub mod rest;
pub mod server;
pub mod swagger;

pub use error::{ApiError, ApiResult};
pub use rest::AppState;
pub use server::{router, ApiServer};
pub use swagger::ApiDoc;
