//! Warehouse (BigQuery `INFORMATION_SCHEMA.JOBS_BY_PROJECT`) row translation
//!
//! Money is derived from bytes billed at a fixed on-demand price per
//! tebibyte; see [`cost_from_bytes`].

use chrono::Utc;
use serde_json::Value;

use super::{
    QueryRecord, expensive_query_entry, get_f64, get_str, get_timestamp, get_u64, normalize_date,
    rank_expensive_queries, rank_user_costs,
};
use crate::models::{
    CostSummary, CostUnit, ExpensiveQueryEntry, ProjectCostEntry, QueryCostAnalysis, TrendPoint,
    UserCostEntry,
};
use crate::services::optimization_rules::classify;
use crate::utils::round_to;

pub const BYTES_PER_TIB: f64 = 1024.0 * 1024.0 * 1024.0 * 1024.0;
pub const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// On-demand cost of scanning `bytes` at `price_per_tb` USD per TiB
#[inline]
pub fn cost_from_bytes(bytes: f64, price_per_tb: f64) -> f64 {
    bytes / BYTES_PER_TIB * price_per_tb
}

/// Columns: `total_bytes_billed`, `total_queries`
pub fn cost_summary(row: &Value, price_per_tb: f64, period_days: u32) -> CostSummary {
    // bytes billed -> USD at the configured per-TiB price
    let total_cost = cost_from_bytes(get_f64(row, "total_bytes_billed"), price_per_tb);
    let queries_run = get_u64(row, "total_queries");
    let avg_cost_per_query = if queries_run > 0 { total_cost / queries_run as f64 } else { 0.0 };

    CostSummary {
        total_cost: round_to(total_cost, 2),
        queries_run,
        avg_cost_per_query: round_to(avg_cost_per_query, 3),
        period_days,
        last_updated: Utc::now(),
        potential_savings: None,
        service_tier: None,
        utilization: None,
        description: None,
    }
}

/// Columns: `job_id`, `query`, `user_email`, `creation_time`,
/// `total_bytes_billed`, `total_bytes_processed`, `elapsed_ms`
pub fn expensive_query(row: &Value, price_per_tb: f64) -> ExpensiveQueryEntry {
    // bytes billed -> USD; bytes processed reported in TiB
    let cost = cost_from_bytes(get_f64(row, "total_bytes_billed"), price_per_tb);
    let tb_processed = get_f64(row, "total_bytes_processed") / BYTES_PER_TIB;
    let elapsed_secs = get_f64(row, "elapsed_ms") / 1000.0;
    let sql = get_str(row, "query");

    expensive_query_entry(QueryRecord {
        id: get_str(row, "job_id").unwrap_or_else(|| "unknown".to_string()),
        sql: sql.as_deref(),
        cost,
        resource_usage: format!("{:.2} TB", tb_processed),
        duration: format!("{}s", elapsed_secs.round() as u64),
        user: get_str(row, "user_email").unwrap_or_else(|| "unknown".to_string()),
        timestamp: get_timestamp(row, "creation_time"),
    })
}

pub fn expensive_queries(rows: &[Value], price_per_tb: f64) -> Vec<ExpensiveQueryEntry> {
    rank_expensive_queries(rows.iter().map(|row| expensive_query(row, price_per_tb)).collect())
}

/// Columns: `project_id`, `total_bytes_billed`
pub fn project_costs(rows: &[Value], price_per_tb: f64) -> Vec<ProjectCostEntry> {
    rows.iter()
        .map(|row| ProjectCostEntry {
            name: get_str(row, "project_id").unwrap_or_else(|| "unknown".to_string()),
            // bytes billed -> USD
            value: round_to(cost_from_bytes(get_f64(row, "total_bytes_billed"), price_per_tb), 2),
            unit: CostUnit::Usd,
            tier: None,
        })
        .collect()
}

/// Columns: `date`, `total_bytes_billed`, `query_count`. Output ascending by date.
pub fn cost_trends(rows: &[Value], price_per_tb: f64) -> Vec<TrendPoint> {
    let mut points: Vec<TrendPoint> = rows
        .iter()
        .map(|row| TrendPoint {
            date: get_str(row, "date").map(|d| normalize_date(&d)).unwrap_or_default(),
            // bytes billed -> USD
            value: round_to(cost_from_bytes(get_f64(row, "total_bytes_billed"), price_per_tb), 2),
            unit: CostUnit::Usd,
            count: get_u64(row, "query_count"),
        })
        .collect();
    points.sort_by(|a, b| a.date.cmp(&b.date));
    points
}

/// Columns: `user_email`, `total_bytes_billed`, `query_count`
pub fn user_costs(rows: &[Value], price_per_tb: f64) -> Vec<UserCostEntry> {
    rank_user_costs(
        rows.iter()
            .map(|row| UserCostEntry {
                identity: get_str(row, "user_email").unwrap_or_else(|| "unknown".to_string()),
                // bytes billed -> USD
                cost: round_to(cost_from_bytes(get_f64(row, "total_bytes_billed"), price_per_tb), 2),
                query_count: get_u64(row, "query_count"),
            })
            .collect(),
    )
}

/// Translate a dry-run job response (`totalBytesProcessed`) into an estimate
pub fn dry_run_analysis(response: &Value, sql: &str, price_per_tb: f64) -> QueryCostAnalysis {
    let bytes = get_f64(response, "totalBytesProcessed");
    QueryCostAnalysis {
        bytes_to_process: Some(format!("{:.2} GB", bytes / BYTES_PER_GIB)),
        // bytes that would be scanned -> USD at the per-TiB price
        estimated_cost: Some(round_to(cost_from_bytes(bytes, price_per_tb), 4)),
        execution_plan: None,
        description: None,
        optimization: classify(sql),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use serde_json::json;

    const PRICE: f64 = 5.0;

    #[test]
    fn test_cost_from_bytes() {
        assert_eq!(cost_from_bytes(BYTES_PER_TIB, PRICE), 5.0);
        assert_eq!(cost_from_bytes(0.0, PRICE), 0.0);
    }

    #[test]
    fn test_cost_summary() {
        let row = json!({"total_bytes_billed": (BYTES_PER_TIB * 200.0).to_string(), "total_queries": "1000"});
        let summary = cost_summary(&row, PRICE, 30);
        assert_eq!(summary.total_cost, 1000.0);
        assert_eq!(summary.queries_run, 1000);
        assert_eq!(summary.avg_cost_per_query, 1.0);
        assert_eq!(summary.period_days, 30);
    }

    #[test]
    fn test_cost_summary_with_null_columns() {
        let row = json!({"total_bytes_billed": null, "total_queries": null});
        let summary = cost_summary(&row, PRICE, 30);
        assert_eq!(summary.total_cost, 0.0);
        assert_eq!(summary.queries_run, 0);
        assert_eq!(summary.avg_cost_per_query, 0.0);
    }

    #[test]
    fn test_expensive_query_row() {
        let row = json!({
            "job_id": "bquxjob_1",
            "query": "SELECT * FROM `p.d.t`",
            "user_email": "a@example.com",
            "creation_time": "1.704164645E9",
            "total_bytes_billed": (BYTES_PER_TIB * 2.0).to_string(),
            "total_bytes_processed": (BYTES_PER_TIB * 2.3).to_string(),
            "elapsed_ms": "45200",
        });
        let entry = expensive_query(&row, PRICE);
        assert_eq!(entry.id, "bquxjob_1");
        assert_eq!(entry.cost, 10.0);
        assert_eq!(entry.resource_usage, "2.30 TB");
        assert_eq!(entry.duration, "45s");
        assert_eq!(entry.finding.as_ref().unwrap().severity, Severity::High);
        assert_eq!(entry.potential_savings, 4.0);
    }

    #[test]
    fn test_degraded_row_is_kept() {
        let row = json!({"job_id": "bquxjob_2", "query": null, "total_bytes_billed": null});
        let entries = expensive_queries(&[row], PRICE);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].cost, 0.0);
        assert!(entries[0].finding.is_none());
    }

    #[test]
    fn test_cost_trends_sorted_ascending() {
        let rows = vec![
            json!({"date": "2024-01-03", "total_bytes_billed": "0", "query_count": "3"}),
            json!({"date": "2024-01-01", "total_bytes_billed": "0", "query_count": "1"}),
        ];
        let points = cost_trends(&rows, PRICE);
        assert_eq!(points[0].date, "2024-01-01");
        assert_eq!(points[1].date, "2024-01-03");
        assert_eq!(points[1].count, 3);
    }

    #[test]
    fn test_user_costs_ranked() {
        let rows: Vec<Value> = (0..25)
            .map(|i| {
                json!({
                    "user_email": format!("u{}@example.com", i),
                    "total_bytes_billed": (BYTES_PER_TIB * i as f64).to_string(),
                    "query_count": "1",
                })
            })
            .collect();
        let users = user_costs(&rows, PRICE);
        assert_eq!(users.len(), 20);
        assert_eq!(users[0].identity, "u24@example.com");
    }

    #[test]
    fn test_dry_run_analysis() {
        let response = json!({"totalBytesProcessed": (BYTES_PER_GIB * 1.5).to_string()});
        let analysis = dry_run_analysis(&response, "SELECT a FROM t WHERE d = 1", PRICE);
        assert_eq!(analysis.bytes_to_process.as_deref(), Some("1.50 GB"));
        assert_eq!(analysis.estimated_cost, Some(0.0073));
        assert_eq!(analysis.optimization.severity, Severity::Low);
    }
}
