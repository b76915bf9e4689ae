//! Supabase backend over PostgREST.
//!
//! Tables are read with `GET /rest/v1/<table>` and PostgREST filter syntax
//! (`col=eq.value`); SQL functions are called with `POST /rest/v1/rpc/<fn>`.

use crate::error::{BackendError, BackendResult};
use crate::records::*;
use crate::source::{AnalyticsBackend, CampaignFilter, ClientSource, StatsFilter};
use async_trait::async_trait;
use outreach_core::config::SupabaseConfig;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::{Duration, Instant};
use tracing::{debug, error};
use url::Url;

const RPC_CLIENT_STATISTICS: &str = "get_client_statistics";
const RPC_PLATFORM_PERFORMANCE: &str = "get_platform_performance";
const RPC_SEND_VOLUME_TRENDS: &str = "get_send_volume_trends";
const RPC_KPI_METRICS: &str = "get_kpi_metrics";
const RPC_CLIENT_DAILY_TRENDS: &str = "get_client_daily_trends";

/// Error body PostgREST sends with non-2xx responses.
#[derive(Debug, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Option<String>,
}

#[derive(Clone)]
pub struct SupabaseBackend {
    http: reqwest::Client,
    rest_url: Url,
    service_key: String,
}

impl SupabaseBackend {
    pub fn new(config: &SupabaseConfig) -> BackendResult<Self> {
        let base = Url::parse(config.url.trim_end_matches('/'))
            .map_err(|e| BackendError::NotConfigured(format!("supabase.url ({e})")))?;
        let rest_url = base
            .join("/rest/v1/")
            .map_err(|e| BackendError::NotConfigured(format!("supabase.url ({e})")))?;
        if config.service_role_key.is_empty() {
            return Err(BackendError::NotConfigured(
                "supabase.service_role_key".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| BackendError::Http {
                source_name: "supabase".to_string(),
                error: e,
            })?;

        Ok(Self {
            http,
            rest_url,
            service_key: config.service_role_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> BackendResult<Url> {
        self.rest_url
            .join(path)
            .map_err(|e| BackendError::NotConfigured(format!("invalid endpoint {path}: {e}")))
    }

    /// `GET /rest/v1/<table>?select=*&<filters>`.
    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> BackendResult<Vec<T>> {
        let url = self.endpoint(table)?;
        let mut query: Vec<(&str, String)> = vec![("select", "*".to_string())];
        query.extend(filters.iter().cloned());

        let request = self
            .http
            .get(url)
            .query(&query)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key);
        self.execute(table, request).await
    }

    /// `POST /rest/v1/rpc/<function>` with named parameters.
    async fn rpc<T: DeserializeOwned>(
        &self,
        function: &str,
        params: Map<String, Value>,
    ) -> BackendResult<Vec<T>> {
        let url = self.endpoint(&format!("rpc/{function}"))?;
        let request = self
            .http
            .post(url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .json(&Value::Object(params));
        self.execute(&format!("rpc/{function}"), request).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        source_name: &str,
        request: reqwest::RequestBuilder,
    ) -> BackendResult<Vec<T>> {
        let start = Instant::now();
        metrics::counter!("backend.requests", "source" => source_name.to_string()).increment(1);

        let result = self.send(source_name, request).await;

        metrics::histogram!("backend.latency_ms", "source" => source_name.to_string())
            .record(start.elapsed().as_secs_f64() * 1000.0);
        if let Err(e) = &result {
            metrics::counter!("backend.errors", "source" => source_name.to_string())
                .increment(1);
            error!(source = source_name, error = %e, "Supabase request failed");
        }
        result
    }

    async fn send<T: DeserializeOwned>(
        &self,
        source_name: &str,
        request: reqwest::RequestBuilder,
    ) -> BackendResult<Vec<T>> {
        let http_err = |error| BackendError::Http {
            source_name: source_name.to_string(),
            error,
        };
        let response = request.send().await.map_err(http_err)?;
        let status = response.status();
        let body = response.text().await.map_err(http_err)?;

        if !status.is_success() {
            let message = match serde_json::from_str::<PostgrestError>(&body) {
                Ok(err) if !err.message.is_empty() => match err.details {
                    Some(details) if !details.is_empty() => format!("{} ({details})", err.message),
                    _ => err.message,
                },
                _ => body.trim().to_string(),
            };
            return Err(BackendError::Upstream {
                source_name: source_name.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let rows: Vec<T> = serde_json::from_str(&body)
            .map_err(|e| BackendError::decode(source_name, e.to_string()))?;
        debug!(source = source_name, rows = rows.len(), "Supabase rows decoded");
        Ok(rows)
    }
}

/// RPC parameters for a stats filter. Unset filters are left out entirely.
fn stats_params(filter: &StatsFilter) -> Map<String, Value> {
    let mut params = Map::new();
    if let Some(start) = filter.start_date {
        params.insert("p_start_date".into(), Value::String(start.to_string()));
    }
    if let Some(end) = filter.end_date {
        params.insert("p_end_date".into(), Value::String(end.to_string()));
    }
    if let Some(platform) = &filter.platform {
        params.insert("p_platform".into(), Value::String(platform.clone()));
    }
    if let Some(client_id) = filter.client_id {
        params.insert("p_client_id".into(), Value::from(client_id));
    }
    params
}

fn eq(value: impl ToString) -> String {
    format!("eq.{}", value.to_string())
}

#[async_trait]
impl ClientSource for SupabaseBackend {
    fn name(&self) -> &'static str {
        "supabase"
    }

    async fn client_statistics(
        &self,
        filter: &StatsFilter,
    ) -> BackendResult<Vec<ClientStatsRecord>> {
        self.rpc(RPC_CLIENT_STATISTICS, stats_params(filter)).await
    }

    async fn clients(&self, client_id: Option<i64>) -> BackendResult<Vec<ClientRecord>> {
        let mut filters = vec![("order", "id.asc".to_string())];
        if let Some(id) = client_id {
            filters.push(("id", eq(id)));
        }
        self.select("clients", &filters).await
    }

    async fn ping(&self) -> BackendResult<()> {
        let _: Vec<Value> = self
            .select("clients", &[("limit", "1".to_string())])
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AnalyticsBackend for SupabaseBackend {
    async fn campaigns(&self, filter: &CampaignFilter) -> BackendResult<Vec<CampaignRecord>> {
        let mut filters = vec![("order", "created_at.desc".to_string())];
        if let Some(status) = &filter.status {
            filters.push(("status", eq(status)));
        }
        if let Some(platform) = &filter.platform {
            filters.push(("platform", eq(platform)));
        }
        if let Some(client_id) = filter.client_id {
            filters.push(("client_id", eq(client_id)));
        }
        self.select("campaigns", &filters).await
    }

    async fn campaign_by_external_id(
        &self,
        campaign_id: &str,
    ) -> BackendResult<Option<CampaignRecord>> {
        let rows: Vec<CampaignRecord> = self
            .select(
                "campaigns",
                &[("campaign_id", eq(campaign_id)), ("limit", "1".to_string())],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn campaign_by_id(&self, id: i64) -> BackendResult<Option<CampaignRecord>> {
        let rows: Vec<CampaignRecord> = self
            .select("campaigns", &[("id", eq(id)), ("limit", "1".to_string())])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn platform_performance(
        &self,
        platform: &str,
        filter: &StatsFilter,
    ) -> BackendResult<Vec<PlatformPerformanceRecord>> {
        let mut params = stats_params(filter);
        params.insert("p_platform".into(), Value::String(platform.to_string()));
        self.rpc(RPC_PLATFORM_PERFORMANCE, params).await
    }

    async fn send_volume_trends(
        &self,
        filter: &StatsFilter,
    ) -> BackendResult<Vec<SendVolumeRecord>> {
        self.rpc(RPC_SEND_VOLUME_TRENDS, stats_params(filter)).await
    }

    async fn kpi_totals(&self, filter: &StatsFilter) -> BackendResult<KpiTotalsRecord> {
        let rows: Vec<KpiTotalsRecord> = self.rpc(RPC_KPI_METRICS, stats_params(filter)).await?;
        match rows.len() {
            0 => Ok(KpiTotalsRecord::default()),
            1 => Ok(rows.into_iter().next().unwrap_or_default()),
            n => Err(BackendError::decode(
                format!("rpc/{RPC_KPI_METRICS}"),
                format!("expected a single totals row, got {n}"),
            )),
        }
    }

    async fn recent_replies(
        &self,
        client_id: i64,
        limit: usize,
    ) -> BackendResult<Vec<ReplyRecord>> {
        self.select(
            "replies",
            &[
                ("client_id", eq(client_id)),
                ("order", "received_at.desc".to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    async fn client_daily_trends(
        &self,
        client_id: i64,
        filter: &StatsFilter,
    ) -> BackendResult<Vec<DailyTrendRecord>> {
        let mut params = stats_params(filter);
        params.insert("p_client_id".into(), Value::from(client_id));
        self.rpc(RPC_CLIENT_DAILY_TRENDS, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> SupabaseBackend {
        SupabaseBackend::new(&SupabaseConfig {
            url: server.uri(),
            service_role_key: "service-key".to_string(),
            request_timeout_ms: 5_000,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_rpc_omits_unset_filters() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/get_client_statistics"))
            .and(header("apikey", "service-key"))
            .and(body_json(serde_json::json!({
                "p_start_date": "2024-03-01",
                "p_client_id": 7
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "client_id": 7, "client_name": "Acme", "emails_sent": 100, "replies": 4,
                "positive_replies": 1, "bounces": 2, "unique_leads": 80,
                "services": ["cold email"]
            }])))
            .mount(&server)
            .await;

        let filter = StatsFilter {
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            client_id: Some(7),
            ..Default::default()
        };
        let rows = backend(&server).client_statistics(&filter).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].services, Some(vec!["cold email".to_string()]));
    }

    #[tokio::test]
    async fn test_table_select_uses_postgrest_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/campaigns"))
            .and(query_param("campaign_id", "eq.cmp_abc"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let found = backend(&server)
            .campaign_by_external_id("cmp_abc")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_upstream_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/get_kpi_metrics"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "code": "PGRST202",
                "message": "Could not find the function public.get_kpi_metrics",
                "details": null,
                "hint": null
            })))
            .mount(&server)
            .await;

        let err = backend(&server)
            .kpi_totals(&StatsFilter::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Upstream { status: 404, .. }));
        assert_eq!(
            err.public_message(),
            "Could not find the function public.get_kpi_metrics"
        );
    }

    #[tokio::test]
    async fn test_unexpected_shape_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/get_send_volume_trends"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{ "day": "2024-03-01", "sent": 10 }])),
            )
            .mount(&server)
            .await;

        let err = backend(&server)
            .send_volume_trends(&StatsFilter::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Decode { .. }));
    }

    #[test]
    fn test_missing_service_key_rejected() {
        let result = SupabaseBackend::new(&SupabaseConfig {
            url: "https://project.supabase.co".to_string(),
            service_role_key: String::new(),
            request_timeout_ms: 1_000,
        });
        assert!(matches!(result, Err(BackendError::NotConfigured(_))));
    }
}
