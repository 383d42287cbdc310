//! Relational (MySQL-protocol cloud database) row translation
//!
//! This backend is priced by provisioned capacity, not per query. Per-query
//! and per-user cost is the provisioned monthly cost apportioned by each
//! consumer's share of total statement latency; when no monthly cost is
//! configured the cost fields are zero and utilization percentages carry the
//! signal instead.

use chrono::Utc;
use serde_json::Value;

use super::{
    QueryRecord, apportion, expensive_query_entry, get_f64, get_str, get_timestamp, get_u64,
    normalize_date, parse_timestamp, rank_expensive_queries, rank_user_costs,
};
use crate::models::{
    CostSummary, CostUnit, DatabaseCostEntry, ExpensiveQueryEntry, OptimizationFinding,
    QueryCostAnalysis, ResourceUtilization, TrendPoint, UserCostEntry,
};
use crate::services::optimization_rules::classify;
use crate::utils::round_to;

/// performance_schema timers are in picoseconds
pub const PICOS_PER_MS: f64 = 1_000_000_000.0;
pub const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

pub const CPU_METRIC: &str = "cpu_percent";
pub const IO_METRIC: &str = "io_consumption_percent";
pub const STORAGE_METRIC: &str = "storage_percent";

/// Provisioned-capacity summary
pub fn cost_summary(
    monthly_cost: f64,
    queries_run: u64,
    service_tier: Option<String>,
    utilization: Option<ResourceUtilization>,
) -> CostSummary {
    let avg_cost_per_query = if queries_run > 0 { monthly_cost / queries_run as f64 } else { 0.0 };
    CostSummary {
        total_cost: round_to(monthly_cost, 2),
        queries_run,
        avg_cost_per_query: round_to(avg_cost_per_query, 3),
        period_days: 30,
        last_updated: Utc::now(),
        potential_savings: None,
        service_tier,
        utilization,
        description: Some(
            "Cost reflects provisioned capacity; per-query cost is apportioned by statement latency"
                .to_string(),
        ),
    }
}

/// Columns from `events_statements_summary_by_digest`: `DIGEST`, `DIGEST_TEXT`,
/// `COUNT_STAR`, `SUM_TIMER_WAIT`, `AVG_TIMER_WAIT`, `LAST_SEEN`, `SCHEMA_NAME`
pub fn expensive_query(row: &Value, total_latency_ps: f64, monthly_cost: f64) -> ExpensiveQueryEntry {
    let latency_ps = get_f64(row, "SUM_TIMER_WAIT");
    let executions = get_u64(row, "COUNT_STAR");
    let sql = get_str(row, "DIGEST_TEXT");

    expensive_query_entry(QueryRecord {
        id: get_str(row, "DIGEST").unwrap_or_else(|| "unknown".to_string()),
        sql: sql.as_deref(),
        // latency share of provisioned monthly cost
        cost: apportion(latency_ps, total_latency_ps, monthly_cost),
        // picoseconds -> milliseconds
        resource_usage: format!(
            "{:.0} ms total latency over {} executions",
            latency_ps / PICOS_PER_MS,
            executions
        ),
        duration: format!("{:.0}ms", get_f64(row, "AVG_TIMER_WAIT") / PICOS_PER_MS),
        // digests carry no account; the default schema is the closest owner
        user: get_str(row, "SCHEMA_NAME")
            .map(|schema| format!("schema:{}", schema))
            .unwrap_or_else(|| "unknown".to_string()),
        timestamp: get_timestamp(row, "LAST_SEEN"),
    })
}

pub fn expensive_queries(
    rows: &[Value],
    total_latency_ps: f64,
    monthly_cost: f64,
) -> Vec<ExpensiveQueryEntry> {
    rank_expensive_queries(
        rows.iter()
            .map(|row| expensive_query(row, total_latency_ps, monthly_cost))
            .collect(),
    )
}

/// Columns: `name`, `size_bytes`. Value is the size in GB.
pub fn database_sizes(rows: &[Value], service_tier: Option<&str>) -> Vec<DatabaseCostEntry> {
    rows.iter()
        .map(|row| DatabaseCostEntry {
            name: get_str(row, "name").unwrap_or_else(|| "unknown".to_string()),
            // bytes -> GB
            value: round_to(get_f64(row, "size_bytes") / BYTES_PER_GB, 2),
            unit: CostUnit::Gigabytes,
            tier: service_tier.map(str::to_string),
        })
        .collect()
}

/// Columns from `events_statements_summary_by_user_by_event_name` grouped by
/// user: `USER`, `exec_count`, `total_latency`
pub fn user_costs(rows: &[Value], total_latency_ps: f64, monthly_cost: f64) -> Vec<UserCostEntry> {
    rank_user_costs(
        rows.iter()
            .map(|row| UserCostEntry {
                identity: get_str(row, "USER").unwrap_or_else(|| "unknown".to_string()),
                // latency share of provisioned monthly cost
                cost: round_to(
                    apportion(get_f64(row, "total_latency"), total_latency_ps, monthly_cost),
                    2,
                ),
                query_count: get_u64(row, "exec_count"),
            })
            .collect(),
    )
}

/// Average of the latest data point for each metric in an Azure Monitor
/// metrics response (`value[].name.value`, `value[].timeseries[0].data[]`)
pub fn utilization(response: &Value) -> ResourceUtilization {
    ResourceUtilization {
        cpu_percent: latest_average(response, CPU_METRIC),
        io_percent: latest_average(response, IO_METRIC),
        storage_percent: latest_average(response, STORAGE_METRIC),
    }
}

fn metric_points<'a>(response: &'a Value, metric: &str) -> &'a [Value] {
    response
        .get("value")
        .and_then(Value::as_array)
        .and_then(|metrics| {
            metrics.iter().find(|m| {
                m.pointer("/name/value").and_then(Value::as_str) == Some(metric)
            })
        })
        .and_then(|m| m.pointer("/timeseries/0/data"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Average of the point with the newest `timeStamp`, skipping points without one
fn latest_average(response: &Value, metric: &str) -> Option<f64> {
    metric_points(response, metric)
        .iter()
        .filter_map(|p| {
            let average = p.get("average").and_then(Value::as_f64)?;
            let at = get_str(p, "timeStamp").as_deref().and_then(parse_timestamp);
            Some((at, average))
        })
        .max_by_key(|(at, _)| *at)
        .map(|(_, average)| round_to(average, 2))
}

/// Daily CPU utilization series, ascending by date. Points without an
/// average are skipped (sparse series).
pub fn cpu_trends(response: &Value) -> Vec<TrendPoint> {
    let mut points: Vec<TrendPoint> = metric_points(response, CPU_METRIC)
        .iter()
        .filter_map(|p| {
            let average = p.get("average").and_then(Value::as_f64)?;
            let date = get_str(p, "timeStamp").map(|d| normalize_date(&d))?;
            Some(TrendPoint { date, value: round_to(average, 2), unit: CostUnit::Percent, count: 0 })
        })
        .collect();
    points.sort_by(|a, b| a.date.cmp(&b.date));
    points
}

/// Translate `EXPLAIN FORMAT=JSON` output. The optimizer cost is in relative
/// units, so no monetary estimate is produced and the finding carries no
/// savings; the classifier's suggestion is kept as advice.
pub fn explain_analysis(plan_text: &str, sql: &str) -> QueryCostAnalysis {
    let plan: Value =
        serde_json::from_str(plan_text).unwrap_or_else(|_| Value::String(plan_text.to_string()));
    let query_cost = plan.pointer("/query_block/cost_info/query_cost").map(|v| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    });

    QueryCostAnalysis {
        bytes_to_process: None,
        estimated_cost: None,
        description: Some(match query_cost {
            Some(cost) => format!(
                "Optimizer cost estimate {} (relative units); cost is driven by CPU and I/O, not data scanned",
                cost
            ),
            None => "Cost is driven by CPU and I/O, not data scanned".to_string(),
        }),
        execution_plan: Some(plan),
        optimization: OptimizationFinding::informational(classify(sql).suggestion),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use serde_json::json;

    fn digest_row(digest: &str, sql: &str, latency_ps: f64) -> Value {
        json!({
            "DIGEST": digest,
            "DIGEST_TEXT": sql,
            "COUNT_STAR": "50",
            "SUM_TIMER_WAIT": latency_ps.to_string(),
            "AVG_TIMER_WAIT": (latency_ps / 50.0).to_string(),
            "LAST_SEEN": "2024-05-01 10:00:00",
            "SCHEMA_NAME": "sales",
        })
    }

    #[test]
    fn test_expensive_queries_apportion_monthly_cost() {
        let rows = vec![
            digest_row("d1", "SELECT * FROM orders", 3.0 * PICOS_PER_MS * 1000.0),
            digest_row("d2", "SELECT id FROM orders WHERE id = ?", 1.0 * PICOS_PER_MS * 1000.0),
        ];
        let total = 4.0 * PICOS_PER_MS * 1000.0;
        let entries = expensive_queries(&rows, total, 800.0);
        assert_eq!(entries[0].id, "d1");
        assert_eq!(entries[0].cost, 600.0);
        assert_eq!(entries[0].potential_savings, 240.0);
        assert_eq!(entries[0].resource_usage, "3000 ms total latency over 50 executions");
        assert_eq!(entries[0].duration, "60ms");
        assert_eq!(entries[1].cost, 200.0);
        assert_eq!(entries[1].finding.as_ref().unwrap().severity, Severity::Low);
    }

    #[test]
    fn test_expensive_query_owner_is_labelled_schema() {
        let entry = expensive_query(&digest_row("d1", "SELECT 1", 1.0), 1.0, 0.0);
        assert_eq!(entry.user, "schema:sales");

        let row = json!({"DIGEST": "d2", "DIGEST_TEXT": "SELECT 1", "SCHEMA_NAME": null});
        assert_eq!(expensive_query(&row, 1.0, 0.0).user, "unknown");
    }

    #[test]
    fn test_expensive_queries_without_pricing_model() {
        let rows = vec![digest_row("d1", "SELECT * FROM orders", 1.0e12)];
        let entries = expensive_queries(&rows, 1.0e12, 0.0);
        assert_eq!(entries[0].cost, 0.0);
        assert_eq!(entries[0].potential_savings, 0.0);
        assert!(entries[0].finding.is_some());
    }

    #[test]
    fn test_database_sizes() {
        let rows = vec![json!({"name": "SalesDB", "size_bytes": (250.0 * BYTES_PER_GB).to_string()})];
        let dbs = database_sizes(&rows, Some("General Purpose"));
        assert_eq!(dbs[0].value, 250.0);
        assert_eq!(dbs[0].unit, CostUnit::Gigabytes);
        assert_eq!(dbs[0].tier.as_deref(), Some("General Purpose"));
    }

    #[test]
    fn test_user_costs() {
        let rows = vec![
            json!({"USER": "reporting", "exec_count": "800", "total_latency": "100"}),
            json!({"USER": "sales_app", "exec_count": "1200", "total_latency": "300"}),
        ];
        let users = user_costs(&rows, 400.0, 400.0);
        assert_eq!(users[0].identity, "sales_app");
        assert_eq!(users[0].cost, 300.0);
        assert_eq!(users[1].query_count, 800);
    }

    #[test]
    fn test_user_named_null_is_kept() {
        let rows = vec![
            json!({"USER": "NULL", "exec_count": "5", "total_latency": "100"}),
            json!({"USER": null, "exec_count": "1", "total_latency": "10"}),
        ];
        let users = user_costs(&rows, 110.0, 0.0);
        assert_eq!(users[0].identity, "NULL");
        assert_eq!(users[1].identity, "unknown");
    }

    fn monitor_response() -> Value {
        json!({
            "value": [
                {
                    "name": {"value": "cpu_percent"},
                    "timeseries": [{"data": [
                        {"timeStamp": "2024-01-02T00:00:00Z", "average": 65.0},
                        {"timeStamp": "2024-01-01T00:00:00Z", "average": 60.123},
                        {"timeStamp": "2024-01-03T00:00:00Z"}
                    ]}]
                },
                {
                    "name": {"value": "storage_percent"},
                    "timeseries": [{"data": [{"timeStamp": "2024-01-03T00:00:00Z", "average": 41.5}]}]
                }
            ]
        })
    }

    #[test]
    fn test_utilization_uses_newest_timestamp() {
        // newest point with an average is 2024-01-02, not the last in the array
        let util = utilization(&monitor_response());
        assert_eq!(util.cpu_percent, Some(65.0));
        assert_eq!(util.storage_percent, Some(41.5));
        assert_eq!(util.io_percent, None);
    }

    #[test]
    fn test_cpu_trends_sparse_and_sorted() {
        let points = cpu_trends(&monitor_response());
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, "2024-01-01");
        assert_eq!(points[0].unit, CostUnit::Percent);
        assert_eq!(points[1].value, 65.0);
    }

    #[test]
    fn test_explain_analysis() {
        let plan = r#"{"query_block": {"select_id": 1, "cost_info": {"query_cost": "1.25"}}}"#;
        let analysis = explain_analysis(plan, "SELECT id FROM orders WHERE id = 1");
        assert!(analysis.description.unwrap().contains("1.25"));
        assert!(analysis.estimated_cost.is_none());
        assert!(analysis.execution_plan.is_some());
        assert_eq!(analysis.optimization.severity, Severity::Info);
    }

    #[test]
    fn test_explain_analysis_claims_no_savings() {
        let plan = r#"{"query_block":{"cost_info":{"query_cost":"9.9"}}}"#;
        let analysis = explain_analysis(plan, "SELECT * FROM orders");
        assert!(analysis.estimated_cost.is_none());
        assert_eq!(analysis.optimization.severity, Severity::Info);
        assert_eq!(analysis.optimization.savings_percent, 0);
        assert!(analysis.optimization.suggestion.contains("columns"));
    }

    #[test]
    fn test_cost_summary() {
        let summary = cost_summary(750.0, 5100, Some("General Purpose".to_string()), None);
        assert_eq!(summary.total_cost, 750.0);
        assert_eq!(summary.avg_cost_per_query, 0.147);
        assert_eq!(summary.period_days, 30);
    }
}
