//! Outreach Dashboard: statistics API for cold-outreach campaigns.
//!
//! `serve` (the default) starts the HTTP API; `range` works with the
//! persisted dashboard date filter.

mod range;

use anyhow::Context;
use clap::{Parser, Subcommand};
use outreach_api::{ApiServer, AppState};
use outreach_backend::{
    AnalyticsBackend, ClientSource, MemoryBackend, PgDirectBackend, SupabaseBackend,
};
use outreach_core::config::{AppConfig, BackendKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "outreach-dashboard")]
#[command(about = "Client, campaign and platform statistics for cold-outreach campaigns")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "OUTREACH_DASHBOARD_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    serve: ServeArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Args, Debug)]
struct ServeArgs {
    /// Node identifier (overrides config)
    #[arg(long, env = "OUTREACH_DASHBOARD__NODE_ID")]
    node_id: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "OUTREACH_DASHBOARD__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Prometheus exporter port (overrides config)
    #[arg(long, env = "OUTREACH_DASHBOARD__METRICS__PORT")]
    metrics_port: Option<u16>,

    /// Supabase project URL
    #[arg(long, env = "SUPABASE_URL")]
    supabase_url: Option<String>,

    /// Supabase service-role key
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    supabase_key: Option<String>,

    /// Postgres URL for /api/clients-direct
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// Serve from a JSON fixture instead of Supabase
    #[arg(long)]
    fixture: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP API (default)
    Serve,
    /// Inspect or change the persisted date filter
    Range {
        #[command(subcommand)]
        action: range::RangeAction,
    },
}

impl ServeArgs {
    fn apply(self, config: &mut AppConfig) {
        if let Some(node_id) = self.node_id {
            config.node_id = node_id;
        }
        if let Some(port) = self.http_port {
            config.api.http_port = port;
        }
        if let Some(port) = self.metrics_port {
            config.metrics.port = port;
        }
        if let Some(url) = self.supabase_url {
            config.supabase.url = url;
        }
        if let Some(key) = self.supabase_key {
            config.supabase.service_role_key = key;
        }
        if let Some(url) = self.database_url {
            config.postgres.url = Some(url);
        }
        if let Some(path) = self.fixture {
            config.backend.kind = BackendKind::Fixture;
            config.backend.fixture_path = Some(path);
        }
    }
}

fn build_backend(config: &AppConfig) -> anyhow::Result<Arc<dyn AnalyticsBackend>> {
    match config.backend.kind {
        BackendKind::Supabase => Ok(Arc::new(SupabaseBackend::new(&config.supabase)?)),
        BackendKind::Fixture => {
            let path = config
                .backend
                .fixture_path
                .as_deref()
                .context("backend.fixture_path is required for the fixture backend")?;
            Ok(Arc::new(MemoryBackend::from_json_file(path)?))
        }
    }
}

fn build_direct_source(config: &AppConfig) -> Option<Arc<dyn ClientSource>> {
    if config.postgres.url.is_none() {
        return None;
    }
    match PgDirectBackend::connect_lazy(&config.postgres) {
        Ok(backend) => Some(Arc::new(backend)),
        Err(e) => {
            error!(error = %e, "Direct Postgres access disabled");
            None
        }
    }
}

/// An explicitly named config file must load. Without one, a bad
/// environment falls back to defaults.
fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(Some(path))
            .with_context(|| format!("failed to load config file {}", path.display())),
        None => Ok(AppConfig::load(None).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            AppConfig::default()
        })),
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    config.validate()?;

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        backend = ?config.backend.kind,
        platforms = ?config.dashboard.platforms,
        "Configuration loaded"
    );

    let backend = build_backend(&config)?;
    let direct = build_direct_source(&config);
    if direct.is_none() {
        info!("No postgres.url configured, /api/clients-direct will answer 503");
    }

    let state = AppState::new(&config, backend, direct)?;
    let api_server = ApiServer::new(config, state);

    // Start metrics exporter
    if let Err(e) = api_server.start_metrics().await {
        error!(error = %e, "Failed to start metrics exporter");
    }

    info!("Outreach Dashboard is ready to serve traffic");

    // Start HTTP server (blocks until shutdown)
    api_server.start_http().await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so `range` output stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "outreach_dashboard=info,outreach_api=info,tower_http=info".into()
            }),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    cli.serve.apply(&mut config);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Range { action } => range::run(action, &config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn test_invalid_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outreach.toml");
        std::fs::write(&path, "[dashboard\ntimezone = ").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_named_config_file_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outreach.toml");
        std::fs::write(&path, "[dashboard]\ntimezone = \"Europe/Berlin\"\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.dashboard.timezone, "Europe/Berlin");
    }
}
