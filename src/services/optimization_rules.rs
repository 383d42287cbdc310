//! Optimization rule classifier
//!
//! Maps raw SQL text to a single [`OptimizationFinding`]. Rules are evaluated in
//! a fixed order and the first match wins:
//! - O001: wildcard projection (`SELECT *`)
//! - O002: cartesian product (`CROSS JOIN`)
//! - O003: no filter and no partition reference
//! - O004: grouping/ordering without the above
//! - O005: fallback, query appears optimized

use crate::models::{OptimizationFinding, Severity};
use once_cell::sync::Lazy;
use regex::Regex;

/// Collapses any whitespace run so `SELECT\n  *` matches `SELECT *`
static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static RULES: Lazy<Vec<Box<dyn OptimizationRule>>> = Lazy::new(get_rules);

/// Upper-cased, whitespace-collapsed SQL text handed to every rule
pub struct SqlContext {
    normalized: String,
}

impl SqlContext {
    pub fn new(sql: &str) -> Self {
        let normalized = WHITESPACE_REGEX.replace_all(sql.trim(), " ").to_uppercase();
        Self { normalized }
    }

    #[inline]
    fn contains(&self, keyword: &str) -> bool {
        self.normalized.contains(keyword)
    }
}

/// One heuristic rule
pub trait OptimizationRule: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn evaluate(&self, context: &SqlContext) -> Option<OptimizationFinding>;
}

// ============================================================================
// O001: Wildcard projection
// ============================================================================

pub struct O001WildcardProjection;

impl OptimizationRule for O001WildcardProjection {
    fn id(&self) -> &str {
        "O001"
    }
    fn name(&self) -> &str {
        "Wildcard projection"
    }

    fn evaluate(&self, context: &SqlContext) -> Option<OptimizationFinding> {
        context.contains("SELECT *").then(|| {
            OptimizationFinding::new(
                "Replace wildcard projection (SELECT *) with explicit columns to reduce data scanned",
                Severity::High,
                40,
            )
        })
    }
}

// ============================================================================
// O002: Cartesian product
// ============================================================================

pub struct O002CrossJoin;

impl OptimizationRule for O002CrossJoin {
    fn id(&self) -> &str {
        "O002"
    }
    fn name(&self) -> &str {
        "Cross join"
    }

    fn evaluate(&self, context: &SqlContext) -> Option<OptimizationFinding> {
        context.contains("CROSS JOIN").then(|| {
            OptimizationFinding::new(
                "Replace cross join with an explicit join condition to avoid a cartesian product",
                Severity::Critical,
                90,
            )
        })
    }
}

// ============================================================================
// O003: Unfiltered scan
// ============================================================================

/// Empty text lacks both clauses and therefore lands here
pub struct O003UnfilteredScan;

impl OptimizationRule for O003UnfilteredScan {
    fn id(&self) -> &str {
        "O003"
    }
    fn name(&self) -> &str {
        "Unfiltered scan"
    }

    fn evaluate(&self, context: &SqlContext) -> Option<OptimizationFinding> {
        let has_filter = context.contains("WHERE");
        let has_partition = context.contains("PARTITION");
        (!has_filter && !has_partition).then(|| {
            OptimizationFinding::new(
                "Add a filter on the partition/date column to reduce data scanned",
                Severity::High,
                70,
            )
        })
    }
}

// ============================================================================
// O004: Grouping or ordering
// ============================================================================

pub struct O004GroupingOrdering;

impl OptimizationRule for O004GroupingOrdering {
    fn id(&self) -> &str {
        "O004"
    }
    fn name(&self) -> &str {
        "Grouping or ordering"
    }

    fn evaluate(&self, context: &SqlContext) -> Option<OptimizationFinding> {
        (context.contains("GROUP BY") || context.contains("ORDER BY")).then(|| {
            OptimizationFinding::new(
                "Add clustering on frequently filtered columns",
                Severity::Medium,
                30,
            )
        })
    }
}

// ============================================================================
// O005: Fallback
// ============================================================================

pub struct O005Optimized;

impl OptimizationRule for O005Optimized {
    fn id(&self) -> &str {
        "O005"
    }
    fn name(&self) -> &str {
        "Optimized"
    }

    fn evaluate(&self, _context: &SqlContext) -> Option<OptimizationFinding> {
        Some(OptimizationFinding::new("Query appears optimized", Severity::Low, 5))
    }
}

/// All rules in evaluation order
pub fn get_rules() -> Vec<Box<dyn OptimizationRule>> {
    vec![
        Box::new(O001WildcardProjection),
        Box::new(O002CrossJoin),
        Box::new(O003UnfilteredScan),
        Box::new(O004GroupingOrdering),
        Box::new(O005Optimized),
    ]
}

/// Classify SQL text. Pure and deterministic; never fails.
pub fn classify(sql: &str) -> OptimizationFinding {
    let context = SqlContext::new(sql);
    RULES
        .iter()
        .find_map(|rule| rule.evaluate(&context))
        .unwrap_or_else(|| OptimizationFinding::new("Query appears optimized", Severity::Low, 5))
}

/// Id of the rule that produced the finding for `sql`, for logging
pub fn matching_rule_id(sql: &str) -> &'static str {
    let context = SqlContext::new(sql);
    let rules: &'static [Box<dyn OptimizationRule>] = &RULES;
    rules
        .iter()
        .find(|rule| rule.evaluate(&context).is_some())
        .map(|rule| rule.id())
        .unwrap_or("O005")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_projection() {
        let finding = classify("SELECT * FROM t");
        assert_eq!(finding.severity, Severity::High);
        assert_eq!(finding.savings_percent, 40);
        assert!(finding.suggestion.contains("columns"));
    }

    #[test]
    fn test_wildcard_is_case_insensitive_and_whitespace_tolerant() {
        let finding = classify("select\n   *\tfrom events where day = '2024-01-01'");
        assert_eq!(finding.severity, Severity::High);
        assert_eq!(finding.savings_percent, 40);
    }

    #[test]
    fn test_cross_join() {
        let finding = classify("SELECT a FROM t CROSS JOIN u");
        assert_eq!(finding.severity, Severity::Critical);
        assert_eq!(finding.savings_percent, 90);
    }

    #[test]
    fn test_cross_join_precedes_grouping() {
        let finding = classify("SELECT a, COUNT(*) FROM t cross join u WHERE x = 1 GROUP BY a ORDER BY a");
        assert_eq!(finding.severity, Severity::Critical);
    }

    #[test]
    fn test_wildcard_precedes_cross_join() {
        let finding = classify("SELECT * FROM t CROSS JOIN u");
        assert_eq!(finding.severity, Severity::High);
        assert_eq!(finding.savings_percent, 40);
    }

    #[test]
    fn test_unfiltered_scan() {
        let finding = classify("SELECT user_id, event FROM events");
        assert_eq!(finding.severity, Severity::High);
        assert_eq!(finding.savings_percent, 70);
        assert!(finding.suggestion.contains("partition"));
    }

    #[test]
    fn test_partition_reference_counts_as_filter() {
        let finding = classify("SELECT a FROM t PARTITION (p20240101)");
        assert_eq!(finding.severity, Severity::Low);
        assert_eq!(finding.savings_percent, 5);
    }

    #[test]
    fn test_grouping_with_filter() {
        let finding = classify("SELECT a, SUM(b) FROM t WHERE d > '2024-01-01' GROUP BY a");
        assert_eq!(finding.severity, Severity::Medium);
        assert_eq!(finding.savings_percent, 30);

        let finding = classify("SELECT a FROM t WHERE d > 1 ORDER BY a");
        assert_eq!(finding.severity, Severity::Medium);
    }

    #[test]
    fn test_optimized_query() {
        let finding = classify("SELECT a FROM t WHERE d = CURRENT_DATE()");
        assert_eq!(finding.severity, Severity::Low);
        assert_eq!(finding.savings_percent, 5);
        assert_eq!(finding.suggestion, "Query appears optimized");
    }

    #[test]
    fn test_empty_input_is_unfiltered() {
        for sql in ["", "   ", "\n\t"] {
            let finding = classify(sql);
            assert_eq!(finding.severity, Severity::High);
            assert_eq!(finding.savings_percent, 70);
        }
    }

    #[test]
    fn test_deterministic() {
        let sql = "SELECT a FROM t GROUP BY a";
        assert_eq!(classify(sql), classify(sql));
    }

    #[test]
    fn test_matching_rule_id() {
        assert_eq!(matching_rule_id("SELECT * FROM t"), "O001");
        assert_eq!(matching_rule_id("SELECT a FROM t CROSS JOIN u"), "O002");
        assert_eq!(matching_rule_id(""), "O003");
        assert_eq!(matching_rule_id("SELECT a FROM t WHERE b = 1 ORDER BY a"), "O004");
        assert_eq!(matching_rule_id("SELECT a FROM t WHERE b = 1"), "O005");
    }

    #[test]
    fn test_rule_order() {
        let ids: Vec<String> = get_rules().iter().map(|r| r.id().to_string()).collect();
        assert_eq!(ids, vec!["O001", "O002", "O003", "O004", "O005"]);
    }
}
