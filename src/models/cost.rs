use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::OptimizationFinding;

/// Aggregate spend over a reporting window
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CostSummary {
    pub total_cost: f64,
    pub queries_run: u64,
    pub avg_cost_per_query: f64,
    pub period_days: u32,
    pub last_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potential_savings: Option<f64>,
    /// Provisioned tier for resource-priced backends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_tier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utilization: Option<ResourceUtilization>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Utilization percentages reported by resource-priced backends
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResourceUtilization {
    pub cpu_percent: Option<f64>,
    pub io_percent: Option<f64>,
    pub storage_percent: Option<f64>,
}

/// One costly query with its classifier finding
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExpensiveQueryEntry {
    pub id: String,
    /// SQL text, at most 200 characters plus a truncation marker
    pub query_text: String,
    pub cost: f64,
    /// Backend-specific consumption, e.g. "2.30 TB" or "1200 ms CPU"
    pub resource_usage: String,
    pub duration: String,
    pub user: String,
    pub timestamp: DateTime<Utc>,
    /// Unset when the backend returned no SQL text for the row
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finding: Option<OptimizationFinding>,
    pub potential_savings: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CostUnit {
    Usd,
    Gigabytes,
    Percent,
}

/// Cost (or size) attributed to one project or database
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectCostEntry {
    pub name: String,
    pub value: f64,
    pub unit: CostUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
}

pub type DatabaseCostEntry = ProjectCostEntry;

/// One day of a cost (or utilization) series
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrendPoint {
    /// Calendar day, `YYYY-MM-DD`
    pub date: String,
    pub value: f64,
    pub unit: CostUnit,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserCostEntry {
    pub identity: String,
    pub cost: f64,
    pub query_count: u64,
}

/// Result of a dry-run cost estimate
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QueryCostAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes_to_process: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub execution_plan: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub optimization: OptimizationFinding,
}

/// Analysis outcome; failures are reported in-band rather than raised
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryCostReport {
    Analysis(QueryCostAnalysis),
    Failed { error: String },
}

impl QueryCostReport {
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed { error: error.into() }
    }
}

/// Natural-language-to-SQL outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NaturalLanguageSql {
    Translated { sql_query: String },
    Unsupported { error: String, unsupported: bool },
    Failed { error: String },
}

impl NaturalLanguageSql {
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::Unsupported { error: reason.into(), unsupported: true }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed { error: error.into() }
    }
}
