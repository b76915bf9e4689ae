use crate::error::{DashboardError, DashboardResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root application configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `OUTREACH_DASHBOARD__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub supabase: SupabaseConfig,
    #[serde(default)]
    pub postgres: PostgresConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// Which data source serves the analytics endpoints.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Supabase,
    Fixture,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_kind")]
    pub kind: BackendKind,
    /// JSON fixture file, only read when `kind = "fixture"`.
    #[serde(default)]
    pub fixture_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub service_role_key: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Direct Postgres pool used by `/api/clients-direct`.
#[derive(Debug, Clone, Deserialize)]
pub struct PostgresConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_statement_timeout_ms")]
    pub statement_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// IANA timezone used for "local midnight" in date presets.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
    /// Outreach platforms queried one by one for platform performance.
    #[serde(default = "default_platforms")]
    pub platforms: Vec<String>,
    #[serde(default = "default_filter_state_path")]
    pub filter_state_path: PathBuf,
}

// Default functions
fn default_node_id() -> String {
    "dashboard-01".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    3000
}
fn default_metrics_enabled() -> bool {
    true
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_backend_kind() -> BackendKind {
    BackendKind::Supabase
}
fn default_request_timeout_ms() -> u64 {
    30_000
}
fn default_max_connections() -> u32 {
    20
}
fn default_idle_timeout_secs() -> u64 {
    30
}
fn default_connect_timeout_ms() -> u64 {
    2_000
}
fn default_statement_timeout_ms() -> u64 {
    300_000
}
fn default_timezone() -> String {
    "UTC".to_string()
}
fn default_page_size() -> usize {
    50
}
fn default_max_page_size() -> usize {
    500
}
fn default_platforms() -> Vec<String> {
    vec!["instantly".to_string(), "smartlead".to_string()]
}
fn default_filter_state_path() -> PathBuf {
    PathBuf::from(".outreach-dashboard/filter-state.json")
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            port: default_metrics_port(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: default_backend_kind(),
            fixture_path: None,
        }
    }
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            service_role_key: String::new(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            idle_timeout_secs: default_idle_timeout_secs(),
            connect_timeout_ms: default_connect_timeout_ms(),
            statement_timeout_ms: default_statement_timeout_ms(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            platforms: default_platforms(),
            filter_state_path: default_filter_state_path(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            backend: BackendConfig::default(),
            supabase: SupabaseConfig::default(),
            postgres: PostgresConfig::default(),
            dashboard: DashboardConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Parse the configured timezone name.
    pub fn tz(&self) -> DashboardResult<chrono_tz::Tz> {
        self.timezone.parse::<chrono_tz::Tz>().map_err(|e| {
            DashboardError::Config(format!("invalid timezone '{}': {}", self.timezone, e))
        })
    }
}

impl AppConfig {
    /// Load configuration from an optional TOML file, then environment
    /// variables (which take precedence).
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let builder = builder.add_source(
            config::Environment::with_prefix("OUTREACH_DASHBOARD")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("dashboard.platforms"),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Check the settings that the selected backend cannot run without.
    pub fn validate(&self) -> DashboardResult<()> {
        if self.backend.kind == BackendKind::Supabase {
            if self.supabase.url.trim().is_empty() {
                return Err(DashboardError::Config("supabase.url is required".into()));
            }
            if self.supabase.service_role_key.trim().is_empty() {
                return Err(DashboardError::Config(
                    "supabase.service_role_key is required".into(),
                ));
            }
        }
        if self.backend.kind == BackendKind::Fixture && self.backend.fixture_path.is_none() {
            return Err(DashboardError::Config(
                "backend.fixture_path is required for the fixture backend".into(),
            ));
        }
        if self.dashboard.default_page_size == 0 || self.dashboard.max_page_size == 0 {
            return Err(DashboardError::Config("page sizes must be positive".into()));
        }
        self.dashboard.tz()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_pool_limits() {
        let config = AppConfig::default();
        assert_eq!(config.postgres.max_connections, 20);
        assert_eq!(config.postgres.idle_timeout_secs, 30);
        assert_eq!(config.postgres.connect_timeout_ms, 2_000);
        assert_eq!(config.postgres.statement_timeout_ms, 300_000);
        assert_eq!(config.dashboard.default_page_size, 50);
    }

    #[test]
    fn test_validate_requires_supabase_credentials() {
        let config = AppConfig::default();
        assert!(matches!(config.validate(), Err(DashboardError::Config(_))));

        let mut config = AppConfig::default();
        config.supabase.url = "https://project.supabase.co".into();
        config.supabase.service_role_key = "service-key".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_timezone_rejected() {
        let mut config = AppConfig::default();
        config.backend.kind = BackendKind::Fixture;
        config.backend.fixture_path = Some(PathBuf::from("fixture.json"));
        config.dashboard.timezone = "Mars/Olympus".into();
        assert!(config.validate().is_err());

        config.dashboard.timezone = "America/New_York".into();
        assert!(config.validate().is_ok());
    }
}
