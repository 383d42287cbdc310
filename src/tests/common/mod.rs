// Common test utilities and helpers

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::AppState;
use crate::config::BackendKind;
use crate::models::{
    CostSummary, ExpensiveQueryEntry, OptimizationFinding, ProjectCostEntry, QueryCostReport,
    Severity, TrendPoint, UserCostEntry,
};
use crate::services::cost_backend::fallback;
use crate::services::{CostBackend, Dispatcher};
use crate::utils::{ApiError, ApiResult, round_to};

/// Expensive query with a fixed finding
pub fn entry(id: &str, cost: f64, savings_percent: u8) -> ExpensiveQueryEntry {
    let finding = OptimizationFinding::new("Select only needed columns", Severity::High, savings_percent);
    ExpensiveQueryEntry {
        id: id.to_string(),
        query_text: "SELECT * FROM t".to_string(),
        cost,
        resource_usage: "1.00 TB".to_string(),
        duration: "10s".to_string(),
        user: "analyst@example.com".to_string(),
        timestamp: Utc::now(),
        potential_savings: round_to(finding.savings_for(cost), 2),
        finding: Some(finding),
    }
}

/// Costs [45.20, 60.00, 10.00] with savings percent [40, 70, 5]
pub fn three_entry_fixture() -> Vec<ExpensiveQueryEntry> {
    vec![entry("q1", 45.20, 40), entry("q2", 60.00, 70), entry("q3", 10.00, 5)]
}

/// In-memory backend with scripted connect and failure behaviour
pub struct StubBackend {
    pub entries: Vec<ExpensiveQueryEntry>,
    connect_ok: bool,
    failure: Option<String>,
    connected: AtomicBool,
    pub connect_calls: AtomicUsize,
}

impl StubBackend {
    pub fn new(entries: Vec<ExpensiveQueryEntry>) -> Self {
        Self {
            entries,
            connect_ok: true,
            failure: None,
            connected: AtomicBool::new(false),
            connect_calls: AtomicUsize::new(0),
        }
    }

    /// `connect` fails, so the dispatcher degrades
    pub fn unreachable(mut self) -> Self {
        self.connect_ok = false;
        self
    }

    /// Every data call fails with a backend failure carrying `message`
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    fn check(&self) -> ApiResult<()> {
        match &self.failure {
            Some(message) => Err(ApiError::backend_failure(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CostBackend for StubBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Warehouse
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> ApiResult<()> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if self.connect_ok {
            self.connected.store(true, Ordering::SeqCst);
            Ok(())
        } else {
            Err(ApiError::connection_unavailable("stub backend is unreachable"))
        }
    }

    async fn get_cost_summary(&self) -> ApiResult<CostSummary> {
        self.check()?;
        Ok(fallback::warehouse_cost_summary())
    }

    async fn get_expensive_queries(&self, _days: u32) -> ApiResult<Vec<ExpensiveQueryEntry>> {
        self.check()?;
        Ok(self.entries.clone())
    }

    async fn get_project_costs(&self) -> ApiResult<Vec<ProjectCostEntry>> {
        self.check()?;
        Ok(fallback::warehouse_project_costs())
    }

    async fn get_cost_trends(&self) -> ApiResult<Vec<TrendPoint>> {
        self.check()?;
        Ok(fallback::warehouse_cost_trends())
    }

    async fn analyze_query_cost(&self, _query: &str, _dry_run: bool) -> ApiResult<QueryCostReport> {
        self.check()?;
        Ok(QueryCostReport::Analysis(fallback::warehouse_query_analysis()))
    }

    async fn get_cost_by_user(&self, _days: u32) -> ApiResult<Vec<UserCostEntry>> {
        self.check()?;
        Ok(fallback::warehouse_user_costs())
    }
}

/// Dispatcher over `backend`, already initialized
pub async fn initialized_dispatcher(backend: StubBackend) -> Arc<Dispatcher> {
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(backend)));
    dispatcher.initialize().await;
    dispatcher
}

pub fn app_state(dispatcher: Arc<Dispatcher>) -> Arc<AppState> {
    Arc::new(AppState::new(dispatcher))
}
