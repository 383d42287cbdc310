// Relational Backend
// Purpose: Implement CostBackend for a provisioned-capacity MySQL-protocol
// cloud database (statement digests, schema sizes, Azure Monitor metrics)

use super::{CostBackend, execution_not_supported, fallback};
use crate::config::{BackendKind, Nl2SqlConfig, RelationalConfig};
use crate::models::{
    CostSummary, ExpensiveQueryEntry, NaturalLanguageSql, ProjectCostEntry, QueryCostReport,
    ResourceUtilization, TrendPoint, UserCostEntry,
};
use crate::services::normalizer::relational as normalize;
use crate::services::normalizer::{get_f64, get_str, get_u64};
use crate::services::{AzureMonitorClient, MySQLClient, Nl2SqlClient};
use crate::utils::{ApiError, ApiResult};
use async_trait::async_trait;
use once_cell::sync::OnceCell;

const DIGEST_TABLE: &str = "performance_schema.events_statements_summary_by_digest";
const USER_TABLE: &str = "performance_schema.events_statements_summary_by_user_by_event_name";
const SYSTEM_SCHEMAS: &str = "'mysql', 'information_schema', 'performance_schema', 'sys'";
const TREND_DAYS: i64 = 30;

pub struct RelationalBackend {
    config: RelationalConfig,
    client: OnceCell<MySQLClient>,
    monitor: Option<AzureMonitorClient>,
    nl2sql: Option<Nl2SqlClient>,
}

impl RelationalBackend {
    pub fn new(config: RelationalConfig, nl2sql: Nl2SqlConfig) -> Self {
        let monitor = AzureMonitorClient::from_config(&config).unwrap_or_else(|e| {
            tracing::error!("[Relational] Failed to build Azure Monitor client: {}", e);
            None
        });
        let nl2sql = Nl2SqlClient::from_config(&nl2sql).unwrap_or_else(|e| {
            tracing::error!("[Relational] Failed to build NL2SQL client: {}", e);
            None
        });

        Self { config, client: OnceCell::new(), monitor, nl2sql }
    }

    fn live(&self) -> Option<&MySQLClient> {
        self.client.get()
    }

    fn service_tier(&self) -> Option<String> {
        self.config.service_tier.clone()
    }

    /// Total statement latency (picoseconds) and statement count across all digests
    async fn digest_totals(&self, client: &MySQLClient) -> ApiResult<(f64, u64)> {
        let sql = format!(
            "SELECT SUM(SUM_TIMER_WAIT) AS total_latency, SUM(COUNT_STAR) AS total_queries FROM {}",
            DIGEST_TABLE
        );
        let rows = client.query(&sql).await?;
        let row = rows.first().cloned().unwrap_or_default();
        Ok((get_f64(&row, "total_latency"), get_u64(&row, "total_queries")))
    }

    /// Optional enrichment; a monitor failure leaves the field unset
    async fn current_utilization(&self) -> Option<ResourceUtilization> {
        let monitor = self.monitor.as_ref()?;
        let metrics = [normalize::CPU_METRIC, normalize::IO_METRIC, normalize::STORAGE_METRIC];
        match monitor.metrics(&metrics, 1, "PT1H").await {
            Ok(response) => Some(normalize::utilization(&response)),
            Err(e) => {
                tracing::warn!("[Relational] Utilization unavailable: {}", e);
                None
            },
        }
    }
}

/// `EXPLAIN` accepts exactly one statement
fn is_single_statement(sql: &str) -> bool {
    !sql.trim().trim_end_matches(';').contains(';')
}

#[async_trait]
impl CostBackend for RelationalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Relational
    }

    fn is_connected(&self) -> bool {
        self.client.get().is_some()
    }

    async fn connect(&self) -> ApiResult<()> {
        if self.is_connected() {
            return Ok(());
        }

        let client = MySQLClient::from_pool(MySQLClient::create_pool(&self.config)?);
        client.ping().await.map_err(|e| {
            tracing::warn!("[Relational] Connection probe failed: {}", e);
            ApiError::connection_unavailable(e.to_string())
        })?;

        tracing::info!(
            "[Relational] Connected to {}:{}",
            self.config.host.as_deref().unwrap_or_default(),
            self.config.port
        );
        let _ = self.client.set(client);
        Ok(())
    }

    async fn get_cost_summary(&self) -> ApiResult<CostSummary> {
        let Some(client) = self.live() else {
            return Ok(fallback::relational_cost_summary());
        };

        let (_, queries_run) = self.digest_totals(client).await?;
        let utilization = self.current_utilization().await;

        Ok(normalize::cost_summary(
            self.config.monthly_cost_usd,
            queries_run,
            self.service_tier(),
            utilization,
        ))
    }

    async fn get_expensive_queries(&self, days: u32) -> ApiResult<Vec<ExpensiveQueryEntry>> {
        let Some(client) = self.live() else {
            return Ok(fallback::relational_expensive_queries());
        };

        let (total_latency, _) = self.digest_totals(client).await?;
        let sql = format!(
            "SELECT DIGEST, DIGEST_TEXT, COUNT_STAR, SUM_TIMER_WAIT, AVG_TIMER_WAIT, LAST_SEEN, SCHEMA_NAME \
             FROM {} WHERE LAST_SEEN >= NOW() - INTERVAL {} DAY \
             ORDER BY SUM_TIMER_WAIT DESC LIMIT 20",
            DIGEST_TABLE, days
        );
        let rows = client.query(&sql).await?;
        tracing::debug!("[Relational] {} statement digests in the last {} days", rows.len(), days);

        Ok(normalize::expensive_queries(&rows, total_latency, self.config.monthly_cost_usd))
    }

    async fn get_project_costs(&self) -> ApiResult<Vec<ProjectCostEntry>> {
        let Some(client) = self.live() else {
            return Ok(fallback::relational_database_sizes());
        };

        let sql = format!(
            "SELECT table_schema AS name, SUM(data_length + index_length) AS size_bytes \
             FROM information_schema.tables WHERE table_schema NOT IN ({}) \
             GROUP BY table_schema ORDER BY size_bytes DESC",
            SYSTEM_SCHEMAS
        );
        let rows = client.query(&sql).await?;

        Ok(normalize::database_sizes(&rows, self.config.service_tier.as_deref()))
    }

    async fn get_cost_trends(&self) -> ApiResult<Vec<TrendPoint>> {
        if !self.is_connected() {
            return Ok(fallback::relational_cpu_trends());
        }
        let Some(monitor) = &self.monitor else {
            tracing::debug!("[Relational] No monitor configured, cost trends are empty");
            return Ok(Vec::new());
        };

        let response = monitor.metrics(&[normalize::CPU_METRIC], TREND_DAYS, "P1D").await?;
        Ok(normalize::cpu_trends(&response))
    }

    async fn analyze_query_cost(&self, query: &str, dry_run: bool) -> ApiResult<QueryCostReport> {
        if !dry_run {
            return Ok(execution_not_supported());
        }
        let Some(client) = self.live() else {
            return Ok(QueryCostReport::Analysis(fallback::relational_query_analysis()));
        };
        if !is_single_statement(query) {
            return Ok(QueryCostReport::failed("Only a single SQL statement can be analyzed"));
        }

        let sql = format!("EXPLAIN FORMAT=JSON {}", query.trim().trim_end_matches(';'));
        match client.query(&sql).await {
            Ok(rows) => {
                let plan = rows
                    .first()
                    .and_then(|row| get_str(row, "EXPLAIN"))
                    .unwrap_or_default();
                Ok(QueryCostReport::Analysis(normalize::explain_analysis(&plan, query)))
            },
            // rejected by the optimizer, reported in-band
            Err(ApiError::BackendFailure(message)) => {
                tracing::info!("[Relational] EXPLAIN rejected: {}", message);
                Ok(QueryCostReport::failed(message))
            },
            Err(e) => Err(e),
        }
    }

    /// Statement totals per account since the server started; the window is
    /// not selectable on this source.
    async fn get_cost_by_user(&self, days: u32) -> ApiResult<Vec<UserCostEntry>> {
        let Some(client) = self.live() else {
            return Ok(fallback::relational_user_costs());
        };

        tracing::debug!("[Relational] Cost by user ignores window of {} days", days);
        let sql = format!(
            "SELECT USER, SUM(COUNT_STAR) AS exec_count, SUM(SUM_TIMER_WAIT) AS total_latency \
             FROM {} WHERE USER IS NOT NULL GROUP BY USER ORDER BY total_latency DESC",
            USER_TABLE
        );
        let rows = client.query(&sql).await?;
        let total_latency: f64 = rows.iter().map(|row| get_f64(row, "total_latency")).sum();

        Ok(normalize::user_costs(&rows, total_latency, self.config.monthly_cost_usd))
    }

    async fn natural_language_to_sql(&self, question: &str) -> ApiResult<NaturalLanguageSql> {
        let Some(nl2sql) = &self.nl2sql else {
            return Ok(NaturalLanguageSql::unsupported(
                "Natural language to SQL requires an nl2sql endpoint, api_key and deployment",
            ));
        };

        match nl2sql.translate(question).await {
            Ok(sql_query) => Ok(NaturalLanguageSql::Translated { sql_query }),
            Err(ApiError::BackendFailure(message)) => {
                tracing::warn!("[Relational] NL2SQL failed: {}", message);
                Ok(NaturalLanguageSql::failed(message))
            },
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CostUnit, Severity};

    fn backend() -> RelationalBackend {
        RelationalBackend::new(RelationalConfig::default(), Nl2SqlConfig::default())
    }

    #[test]
    fn test_is_single_statement() {
        assert!(is_single_statement("SELECT 1"));
        assert!(is_single_statement("SELECT 1;  "));
        assert!(!is_single_statement("SELECT 1; DROP TABLE t"));
    }

    #[tokio::test]
    async fn test_unconnected_serves_fallback() {
        let backend = backend();
        let summary = backend.get_cost_summary().await.unwrap();
        assert_eq!(summary.service_tier.as_deref(), Some("General Purpose"));
        assert!(summary.utilization.is_some());

        let dbs = backend.get_project_costs().await.unwrap();
        assert_eq!(dbs.len(), 2);
        assert_eq!(dbs[0].unit, CostUnit::Gigabytes);

        let trends = backend.get_cost_trends().await.unwrap();
        assert_eq!(trends.len(), 7);
        assert_eq!(trends[0].unit, CostUnit::Percent);

        assert_eq!(backend.get_expensive_queries(7).await.unwrap()[0].id, "query_hash_1");
        assert_eq!(backend.get_cost_by_user(30).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_connect_without_host_fails() {
        let err = backend().connect().await.unwrap_err();
        assert!(matches!(err, ApiError::ConnectionUnavailable(_)));
    }

    #[tokio::test]
    async fn test_analyze_without_connection() {
        let QueryCostReport::Analysis(analysis) =
            backend().analyze_query_cost("SELECT * FROM orders", true).await.unwrap()
        else {
            panic!("expected analysis");
        };
        assert_eq!(analysis.optimization.severity, Severity::Info);
        assert!(analysis.estimated_cost.is_none());
    }

    #[tokio::test]
    async fn test_natural_language_without_endpoint() {
        let result = backend().natural_language_to_sql("monthly revenue").await.unwrap();
        assert!(matches!(result, NaturalLanguageSql::Unsupported { .. }));
    }
}
