//! Direct Postgres access for the client list, bypassing PostgREST.
//!
//! One pool per process, shared by every request.

use crate::error::{BackendError, BackendResult};
use crate::records::{ClientRecord, ClientStatsRecord};
use crate::source::{ClientSource, StatsFilter};
use async_trait::async_trait;
use outreach_core::config::PostgresConfig;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;
use tracing::{error, info};

const CLIENT_STATISTICS_SQL: &str = r#"
    SELECT client_id, client_name, emails_sent, replies, positive_replies,
           bounces, unique_leads, onboarding_date, services
    FROM get_client_statistics($1, $2, $3, $4)
"#;

const CLIENTS_SQL: &str = r#"
    SELECT id, client_name, contact_name, email, phone, industry, website,
           instantly_api_key, smartlead_api_key, onboarding_date, created_at
    FROM clients
    WHERE ($1::bigint IS NULL OR id = $1)
    ORDER BY id
"#;

#[derive(Clone)]
pub struct PgDirectBackend {
    pool: PgPool,
}

impl PgDirectBackend {
    /// Build the pool. Connections are opened lazily on first use.
    pub fn connect_lazy(config: &PostgresConfig) -> BackendResult<Self> {
        let url = config
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| BackendError::NotConfigured("postgres.url".to_string()))?;

        let options = PgConnectOptions::from_str(url)?
            .options([("statement_timeout", config.statement_timeout_ms.to_string())]);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .acquire_timeout(Duration::from_millis(config.connect_timeout_ms))
            .connect_lazy_with(options);

        info!(
            max_connections = config.max_connections,
            statement_timeout_ms = config.statement_timeout_ms,
            "Direct Postgres pool configured"
        );
        Ok(Self { pool })
    }
}

#[async_trait]
impl ClientSource for PgDirectBackend {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn client_statistics(
        &self,
        filter: &StatsFilter,
    ) -> BackendResult<Vec<ClientStatsRecord>> {
        metrics::counter!("backend.requests", "source" => "pg/client_statistics").increment(1);
        sqlx::query_as::<_, ClientStatsRecord>(CLIENT_STATISTICS_SQL)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .bind(filter.platform.as_deref())
            .bind(filter.client_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                metrics::counter!("backend.errors", "source" => "pg/client_statistics")
                    .increment(1);
                error!(error = %e, "Direct client statistics query failed");
                BackendError::from(e)
            })
    }

    async fn clients(&self, client_id: Option<i64>) -> BackendResult<Vec<ClientRecord>> {
        metrics::counter!("backend.requests", "source" => "pg/clients").increment(1);
        sqlx::query_as::<_, ClientRecord>(CLIENTS_SQL)
            .bind(client_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                metrics::counter!("backend.errors", "source" => "pg/clients").increment(1);
                error!(error = %e, "Direct clients query failed");
                BackendError::from(e)
            })
    }

    async fn ping(&self) -> BackendResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
