// Cost Backend Module
// Purpose: Provide one capability interface over heterogeneous cost sources
// (pay-per-scan warehouse, provisioned relational database)
// Design: Dynamic dispatch via trait object chosen once at startup

pub mod fallback;
mod relational;
mod warehouse;

pub use relational::RelationalBackend;
pub use warehouse::WarehouseBackend;

use crate::config::{BackendKind, Config};
use crate::models::{
    CostSummary, ExpensiveQueryEntry, NaturalLanguageSql, ProjectCostEntry, QueryCostReport,
    TrendPoint, UserCostEntry,
};
use crate::utils::ApiResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Look-back window for expensive queries when the caller gives none
pub const DEFAULT_EXPENSIVE_QUERY_DAYS: u32 = 7;

/// Cost backend trait - unified interface for every cost source
///
/// Until [`CostBackend::connect`] succeeds every method returns the backend's
/// fallback dataset with the live shape. Once connected, failed live calls are
/// returned as `BackendFailure`.
#[async_trait]
pub trait CostBackend: Send + Sync {
    /// Backend variant
    fn kind(&self) -> BackendKind;

    /// Whether live calls are being made
    fn is_connected(&self) -> bool;

    /// Establish the connection. Idempotent: a second call on a connected
    /// backend is a no-op.
    async fn connect(&self) -> ApiResult<()>;

    // ========================================
    // Resources
    // ========================================

    async fn get_cost_summary(&self) -> ApiResult<CostSummary>;

    /// Most expensive queries of the last `days`, at most 20, cost descending
    async fn get_expensive_queries(&self, days: u32) -> ApiResult<Vec<ExpensiveQueryEntry>>;

    /// Cost per project (warehouse) or size per database (relational)
    async fn get_project_costs(&self) -> ApiResult<Vec<ProjectCostEntry>>;

    /// Daily series, ascending by date
    async fn get_cost_trends(&self) -> ApiResult<Vec<TrendPoint>>;

    // ========================================
    // Tools
    // ========================================

    /// Estimate without executing when `dry_run` is set. Analysis failures such
    /// as a syntax error come back in-band as [`QueryCostReport::Failed`].
    async fn analyze_query_cost(&self, query: &str, dry_run: bool) -> ApiResult<QueryCostReport>;

    /// Cost per user over the last `days`, at most 20, cost descending
    async fn get_cost_by_user(&self, days: u32) -> ApiResult<Vec<UserCostEntry>>;

    async fn natural_language_to_sql(&self, _question: &str) -> ApiResult<NaturalLanguageSql> {
        Ok(NaturalLanguageSql::unsupported(format!(
            "Natural language to SQL is not supported for the {} backend",
            self.kind().as_str()
        )))
    }
}

/// Create backend based on configured kind (factory method). The backend
/// starts unconnected.
pub fn create_backend(config: &Config) -> Arc<dyn CostBackend> {
    match config.backend.kind {
        BackendKind::Warehouse => Arc::new(WarehouseBackend::new(config.warehouse.clone())),
        BackendKind::Relational => {
            Arc::new(RelationalBackend::new(config.relational.clone(), config.nl2sql.clone()))
        },
    }
}

/// Non-dry-run analysis is not offered; the finding says so instead of
/// inventing a cost
pub(crate) fn execution_not_supported() -> QueryCostReport {
    use crate::models::{OptimizationFinding, QueryCostAnalysis};

    QueryCostReport::Analysis(QueryCostAnalysis {
        bytes_to_process: None,
        estimated_cost: None,
        execution_plan: None,
        description: None,
        optimization: OptimizationFinding::informational(
            "Only dry-run estimation is supported; set dry_run to true",
        ),
    })
}
