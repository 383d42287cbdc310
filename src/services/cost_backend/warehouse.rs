// Warehouse Backend
// Purpose: Implement CostBackend for BigQuery on-demand (bytes-scanned) pricing
// Source: `region-<r>.INFORMATION_SCHEMA.JOBS_BY_PROJECT`

use super::{CostBackend, execution_not_supported, fallback};
use crate::config::{BackendKind, WarehouseConfig};
use crate::models::{
    CostSummary, ExpensiveQueryEntry, ProjectCostEntry, QueryCostReport, TrendPoint,
    UserCostEntry,
};
use crate::services::BigQueryClient;
use crate::services::normalizer::warehouse as normalize;
use crate::utils::{ApiError, ApiResult};
use async_trait::async_trait;
use once_cell::sync::OnceCell;

/// Reporting window of the summary, project and trend resources
const PERIOD_DAYS: u32 = 30;

pub struct WarehouseBackend {
    config: WarehouseConfig,
    client: OnceCell<BigQueryClient>,
}

impl WarehouseBackend {
    pub fn new(config: WarehouseConfig) -> Self {
        Self { config, client: OnceCell::new() }
    }

    fn live(&self) -> Option<&BigQueryClient> {
        self.client.get()
    }

    fn jobs_table(&self, client: &BigQueryClient) -> String {
        format!(
            "`{}.{}.INFORMATION_SCHEMA.JOBS_BY_PROJECT`",
            client.project_id(),
            self.config.region
        )
    }

    /// Finished SELECT jobs created within the last `days`
    fn jobs_filter(days: u32) -> String {
        format!(
            "creation_time >= TIMESTAMP_SUB(CURRENT_TIMESTAMP(), INTERVAL {} DAY) \
             AND statement_type = 'SELECT' AND state = 'DONE'",
            days
        )
    }
}

#[async_trait]
impl CostBackend for WarehouseBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Warehouse
    }

    fn is_connected(&self) -> bool {
        self.client.get().is_some()
    }

    async fn connect(&self) -> ApiResult<()> {
        if self.is_connected() {
            return Ok(());
        }

        let client = BigQueryClient::new(&self.config)?;
        client.query("SELECT 1").await.map_err(|e| {
            tracing::warn!("[Warehouse] Connection probe failed: {}", e);
            ApiError::connection_unavailable(e.to_string())
        })?;

        tracing::info!("[Warehouse] Connected to project {}", client.project_id());
        let _ = self.client.set(client);
        Ok(())
    }

    async fn get_cost_summary(&self) -> ApiResult<CostSummary> {
        let Some(client) = self.live() else {
            return Ok(fallback::warehouse_cost_summary());
        };

        let sql = format!(
            "SELECT SUM(total_bytes_billed) AS total_bytes_billed, COUNT(*) AS total_queries \
             FROM {} WHERE {}",
            self.jobs_table(client),
            Self::jobs_filter(PERIOD_DAYS)
        );
        let rows = client.query(&sql).await?;
        let row = rows.first().cloned().unwrap_or_default();

        Ok(normalize::cost_summary(&row, self.config.price_per_tb, PERIOD_DAYS))
    }

    async fn get_expensive_queries(&self, days: u32) -> ApiResult<Vec<ExpensiveQueryEntry>> {
        let Some(client) = self.live() else {
            return Ok(fallback::warehouse_expensive_queries());
        };

        let sql = format!(
            "SELECT job_id, query, user_email, creation_time, total_bytes_billed, \
             total_bytes_processed, TIMESTAMP_DIFF(end_time, start_time, MILLISECOND) AS elapsed_ms \
             FROM {} WHERE {} AND total_bytes_billed > 0 \
             ORDER BY total_bytes_billed DESC LIMIT 20",
            self.jobs_table(client),
            Self::jobs_filter(days)
        );
        let rows = client.query(&sql).await?;
        tracing::debug!("[Warehouse] {} expensive jobs in the last {} days", rows.len(), days);

        Ok(normalize::expensive_queries(&rows, self.config.price_per_tb))
    }

    async fn get_project_costs(&self) -> ApiResult<Vec<ProjectCostEntry>> {
        let Some(client) = self.live() else {
            return Ok(fallback::warehouse_project_costs());
        };

        let sql = format!(
            "SELECT project_id, SUM(total_bytes_billed) AS total_bytes_billed \
             FROM {} WHERE {} GROUP BY project_id ORDER BY total_bytes_billed DESC",
            self.jobs_table(client),
            Self::jobs_filter(PERIOD_DAYS)
        );
        let rows = client.query(&sql).await?;

        Ok(normalize::project_costs(&rows, self.config.price_per_tb))
    }

    async fn get_cost_trends(&self) -> ApiResult<Vec<TrendPoint>> {
        let Some(client) = self.live() else {
            return Ok(fallback::warehouse_cost_trends());
        };

        let sql = format!(
            "SELECT DATE(creation_time) AS date, SUM(total_bytes_billed) AS total_bytes_billed, \
             COUNT(*) AS query_count FROM {} WHERE {} GROUP BY date ORDER BY date",
            self.jobs_table(client),
            Self::jobs_filter(PERIOD_DAYS)
        );
        let rows = client.query(&sql).await?;

        Ok(normalize::cost_trends(&rows, self.config.price_per_tb))
    }

    async fn analyze_query_cost(&self, query: &str, dry_run: bool) -> ApiResult<QueryCostReport> {
        if !dry_run {
            return Ok(execution_not_supported());
        }
        let Some(client) = self.live() else {
            return Ok(QueryCostReport::Analysis(fallback::warehouse_query_analysis()));
        };

        match client.dry_run(query).await {
            Ok(response) => Ok(QueryCostReport::Analysis(normalize::dry_run_analysis(
                &response,
                query,
                self.config.price_per_tb,
            ))),
            // rejected by the planner, reported in-band
            Err(ApiError::BackendFailure(message)) => {
                tracing::info!("[Warehouse] Dry run rejected: {}", message);
                Ok(QueryCostReport::failed(message))
            },
            Err(e) => Err(e),
        }
    }

    async fn get_cost_by_user(&self, days: u32) -> ApiResult<Vec<UserCostEntry>> {
        let Some(client) = self.live() else {
            return Ok(fallback::warehouse_user_costs());
        };

        let sql = format!(
            "SELECT user_email, SUM(total_bytes_billed) AS total_bytes_billed, COUNT(*) AS query_count \
             FROM {} WHERE {} GROUP BY user_email ORDER BY total_bytes_billed DESC LIMIT 20",
            self.jobs_table(client),
            Self::jobs_filter(days)
        );
        let rows = client.query(&sql).await?;

        Ok(normalize::user_costs(&rows, self.config.price_per_tb))
    }
}
