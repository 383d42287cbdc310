//! Static fallback datasets served while a backend is not connected
//!
//! Shapes are identical to live results so callers never special-case
//! connectivity. Query rows go through the normalizer so their findings come
//! from the classifier, not from hand-written values.

use chrono::{Duration, Utc};

use crate::models::{
    CostSummary, CostUnit, DatabaseCostEntry, ExpensiveQueryEntry, OptimizationFinding,
    ProjectCostEntry, QueryCostAnalysis, ResourceUtilization, TrendPoint, UserCostEntry,
};
use crate::services::normalizer::{QueryRecord, expensive_query_entry, rank_expensive_queries};

fn trend_dates(days: i64) -> impl Iterator<Item = (i64, String)> {
    let today = Utc::now().date_naive();
    (0..days).map(move |i| (i, (today - Duration::days(days - 1 - i)).format("%Y-%m-%d").to_string()))
}

fn query(id: &str, sql: &str, cost: f64, usage: &str, duration: &str, user: &str) -> ExpensiveQueryEntry {
    expensive_query_entry(QueryRecord {
        id: id.to_string(),
        sql: Some(sql),
        cost,
        resource_usage: usage.to_string(),
        duration: duration.to_string(),
        user: user.to_string(),
        timestamp: Utc::now(),
    })
}

// ========================================
// Warehouse
// ========================================

pub fn warehouse_cost_summary() -> CostSummary {
    CostSummary {
        total_cost: 1240.50,
        queries_run: 8450,
        avg_cost_per_query: 0.147,
        period_days: 30,
        last_updated: Utc::now(),
        potential_savings: Some(285.40),
        service_tier: None,
        utilization: None,
        description: None,
    }
}

pub fn warehouse_expensive_queries() -> Vec<ExpensiveQueryEntry> {
    rank_expensive_queries(vec![
        query(
            "job_123",
            "SELECT * FROM `project.dataset.large_table` WHERE date > '2024-01-01'",
            45.20,
            "2.30 TB",
            "45s",
            "data-team@company.com",
        ),
        query(
            "job_456",
            "SELECT user_id, event_name FROM `project.analytics.events`",
            60.00,
            "3.05 TB",
            "72s",
            "analytics@company.com",
        ),
        query(
            "job_789",
            "SELECT id FROM `project.sales.orders` WHERE order_date = CURRENT_DATE()",
            10.00,
            "0.51 TB",
            "12s",
            "eng-team@company.com",
        ),
    ])
}

pub fn warehouse_project_costs() -> Vec<ProjectCostEntry> {
    [("Analytics", 450.00), ("Data Science", 320.00), ("Marketing", 180.00), ("Engineering", 290.00)]
        .into_iter()
        .map(|(name, cost)| ProjectCostEntry {
            name: name.to_string(),
            value: cost,
            unit: CostUnit::Usd,
            tier: None,
        })
        .collect()
}

pub fn warehouse_cost_trends() -> Vec<TrendPoint> {
    trend_dates(7)
        .map(|(i, date)| TrendPoint {
            date,
            value: 150.0 + (i as f64 * 10.0),
            unit: CostUnit::Usd,
            count: 1200 + (i as u64 * 100),
        })
        .collect()
}

pub fn warehouse_user_costs() -> Vec<UserCostEntry> {
    [
        ("data-team@company.com", 450.50, 2340),
        ("analytics@company.com", 320.30, 1890),
        ("eng-team@company.com", 290.20, 1560),
    ]
    .into_iter()
    .map(|(identity, cost, query_count)| UserCostEntry {
        identity: identity.to_string(),
        cost,
        query_count,
    })
    .collect()
}

pub fn warehouse_query_analysis() -> QueryCostAnalysis {
    QueryCostAnalysis {
        bytes_to_process: Some("1.5 GB".to_string()),
        estimated_cost: Some(0.0075),
        execution_plan: None,
        description: Some("Illustrative estimate; no warehouse connection".to_string()),
        optimization: OptimizationFinding::informational(
            "Query analysis requires a live warehouse connection",
        ),
    }
}

// ========================================
// Relational
// ========================================

pub fn relational_cost_summary() -> CostSummary {
    CostSummary {
        total_cost: 750.00,
        queries_run: 5100,
        avg_cost_per_query: 0.147,
        period_days: 30,
        last_updated: Utc::now(),
        potential_savings: None,
        service_tier: Some("General Purpose".to_string()),
        utilization: Some(ResourceUtilization {
            cpu_percent: Some(65.0),
            io_percent: Some(40.0),
            storage_percent: Some(55.0),
        }),
        description: Some(
            "Cost reflects provisioned capacity; per-query cost is apportioned by statement latency"
                .to_string(),
        ),
    }
}

pub fn relational_expensive_queries() -> Vec<ExpensiveQueryEntry> {
    rank_expensive_queries(vec![
        query(
            "query_hash_1",
            "SELECT * FROM sales.orders WHERE order_date > '2024-01-01'",
            120.00,
            "1200 ms total latency over 50 executions",
            "24ms",
            "schema:sales",
        ),
        query(
            "query_hash_2",
            "SELECT customer_id, SUM(total) FROM sales.orders GROUP BY customer_id ORDER BY 2 DESC",
            80.00,
            "800 ms total latency over 20 executions",
            "40ms",
            "schema:reporting",
        ),
    ])
}

pub fn relational_database_sizes() -> Vec<DatabaseCostEntry> {
    [("SalesDB", 250.0), ("ReportingDB", 150.0)]
        .into_iter()
        .map(|(name, size_gb)| DatabaseCostEntry {
            name: name.to_string(),
            value: size_gb,
            unit: CostUnit::Gigabytes,
            tier: Some("General Purpose".to_string()),
        })
        .collect()
}

pub fn relational_cpu_trends() -> Vec<TrendPoint> {
    trend_dates(7)
        .map(|(i, date)| TrendPoint {
            date,
            value: 60.0 + (i as f64 * 2.0),
            unit: CostUnit::Percent,
            count: 0,
        })
        .collect()
}

pub fn relational_user_costs() -> Vec<UserCostEntry> {
    [("sales_app_user", 450.00, 1200), ("reporting_user", 300.00, 800)]
        .into_iter()
        .map(|(identity, cost, query_count)| UserCostEntry {
            identity: identity.to_string(),
            cost,
            query_count,
        })
        .collect()
}

pub fn relational_query_analysis() -> QueryCostAnalysis {
    QueryCostAnalysis {
        bytes_to_process: None,
        estimated_cost: None,
        execution_plan: None,
        description: Some("Cost is driven by CPU and I/O, not data scanned".to_string()),
        optimization: OptimizationFinding::informational(
            "Query plan analysis requires a live database connection",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    #[test]
    fn test_warehouse_queries_are_classified() {
        let queries = warehouse_expensive_queries();
        assert_eq!(queries.len(), 3);
        // ranked by cost
        assert_eq!(queries[0].id, "job_456");
        assert_eq!(queries[0].finding.as_ref().unwrap().savings_percent, 70);
        assert_eq!(queries[0].potential_savings, 42.0);
        assert_eq!(queries[1].finding.as_ref().unwrap().severity, Severity::High);
        assert_eq!(queries[1].potential_savings, 18.08);
        assert_eq!(queries[2].finding.as_ref().unwrap().savings_percent, 5);
    }

    #[test]
    fn test_trends_ascending_seven_days() {
        for trends in [warehouse_cost_trends(), relational_cpu_trends()] {
            assert_eq!(trends.len(), 7);
            assert!(trends.windows(2).all(|w| w[0].date < w[1].date));
        }
        assert_eq!(warehouse_cost_trends()[6].value, 210.0);
        assert_eq!(warehouse_cost_trends()[6].count, 1800);
    }

    #[test]
    fn test_fallback_analysis_is_informational() {
        for analysis in [warehouse_query_analysis(), relational_query_analysis()] {
            assert_eq!(analysis.optimization.severity, Severity::Info);
            assert_eq!(analysis.optimization.savings_percent, 0);
        }
    }
}
