//! Cost Record Normalizer
//!
//! Translates backend-native rows (JSON objects keyed by column name, as
//! produced by the BigQuery and MySQL clients) into the canonical records in
//! [`crate::models`]. No other component inspects native rows.
//!
//! Conversion never fails: a missing or NULL numeric column becomes zero and
//! the row is kept; a row without SQL text keeps its `finding` unset.

pub mod relational;
pub mod warehouse;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use crate::models::{ExpensiveQueryEntry, UserCostEntry};
use crate::services::optimization_rules::classify;
use crate::utils::{round_to, top_n_desc_by, truncate_chars};

/// Maximum characters of SQL text kept per expensive-query entry
pub const MAX_QUERY_TEXT_CHARS: usize = 200;

/// Cap for "expensive queries" and "cost by user" listings
pub const MAX_RANKED_ROWS: usize = 20;

// ========================================
// Row accessors
// ========================================

/// String column; `None` when missing or JSON null
pub fn get_str(row: &Value, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Numeric column; zero when missing, NULL or unparsable
pub fn get_f64(row: &Value, key: &str) -> f64 {
    let parsed = match row.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => v,
        _ => {
            tracing::debug!("Column '{}' missing or not numeric, substituting 0", key);
            0.0
        },
    }
}

/// Non-negative integer column; zero when missing, NULL or unparsable
pub fn get_u64(row: &Value, key: &str) -> u64 {
    let v = get_f64(row, key);
    if v > 0.0 { v.round() as u64 } else { 0 }
}

/// Timestamp column. Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.f]` and epoch
/// seconds (BigQuery REST encodes TIMESTAMP as float seconds). Falls back to
/// the Unix epoch.
pub fn get_timestamp(row: &Value, key: &str) -> DateTime<Utc> {
    get_str(row, key).as_deref().and_then(parse_timestamp).unwrap_or_default()
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    let secs = raw.parse::<f64>().ok()?;
    let millis = (secs * 1000.0).round() as i64;
    Utc.timestamp_millis_opt(millis).single()
}

/// Normalize a date-ish column to `YYYY-MM-DD`; unparsable text is kept as-is
pub fn normalize_date(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    match parse_timestamp(raw) {
        Some(ts) => ts.format("%Y-%m-%d").to_string(),
        None => raw.to_string(),
    }
}

// ========================================
// Canonical builders
// ========================================

/// Fields of one expensive query after unit conversion
pub struct QueryRecord<'a> {
    pub id: String,
    pub sql: Option<&'a str>,
    pub cost: f64,
    pub resource_usage: String,
    pub duration: String,
    pub user: String,
    pub timestamp: DateTime<Utc>,
}

/// Build an [`ExpensiveQueryEntry`]: classify the full SQL text, then truncate
/// it for display. Cost and savings are rounded to cents.
pub fn expensive_query_entry(record: QueryRecord<'_>) -> ExpensiveQueryEntry {
    let cost = round_to(record.cost.max(0.0), 2);
    let finding = record.sql.map(classify);
    let potential_savings = finding.as_ref().map(|f| round_to(f.savings_for(cost), 2)).unwrap_or(0.0);

    ExpensiveQueryEntry {
        id: record.id,
        query_text: truncate_chars(record.sql.unwrap_or_default(), MAX_QUERY_TEXT_CHARS),
        cost,
        resource_usage: record.resource_usage,
        duration: record.duration,
        user: record.user,
        timestamp: record.timestamp,
        finding,
        potential_savings,
    }
}

/// Top [`MAX_RANKED_ROWS`] entries by cost, ties in input order
pub fn rank_expensive_queries(entries: Vec<ExpensiveQueryEntry>) -> Vec<ExpensiveQueryEntry> {
    top_n_desc_by(entries, MAX_RANKED_ROWS, |e| e.cost)
}

/// Top [`MAX_RANKED_ROWS`] users by cost, ties in input order
pub fn rank_user_costs(entries: Vec<UserCostEntry>) -> Vec<UserCostEntry> {
    top_n_desc_by(entries, MAX_RANKED_ROWS, |e| e.cost)
}

/// Share of `total_cost` attributed to a consumer of `part` out of `whole`
pub fn apportion(part: f64, whole: f64, total_cost: f64) -> f64 {
    if whole <= 0.0 || part <= 0.0 {
        return 0.0;
    }
    total_cost * (part / whole)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use crate::utils::TRUNCATION_MARKER;
    use serde_json::json;

    fn record<'a>(id: &str, sql: Option<&'a str>, cost: f64) -> QueryRecord<'a> {
        QueryRecord {
            id: id.to_string(),
            sql,
            cost,
            resource_usage: "1.00 TB".to_string(),
            duration: "10s".to_string(),
            user: "analyst@example.com".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_get_f64_substitutes_zero() {
        let row = json!({"a": "12.5", "b": "", "c": null, "d": "abc", "e": 3});
        assert_eq!(get_f64(&row, "a"), 12.5);
        assert_eq!(get_f64(&row, "b"), 0.0);
        assert_eq!(get_f64(&row, "c"), 0.0);
        assert_eq!(get_f64(&row, "d"), 0.0);
        assert_eq!(get_f64(&row, "e"), 3.0);
        assert_eq!(get_f64(&row, "missing"), 0.0);
    }

    #[test]
    fn test_get_str_null_handling() {
        let row = json!({"a": "x", "b": "NULL", "c": null, "d": 42});
        assert_eq!(get_str(&row, "a").as_deref(), Some("x"));
        // a literal "NULL" value is data, not SQL NULL
        assert_eq!(get_str(&row, "b").as_deref(), Some("NULL"));
        assert_eq!(get_str(&row, "c"), None);
        assert_eq!(get_str(&row, "d").as_deref(), Some("42"));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(parse_timestamp("2024-01-02T03:04:05Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02 03:04:05"), Some(expected));
        assert_eq!(parse_timestamp(&expected.timestamp().to_string()), Some(expected));
        assert_eq!(parse_timestamp("1.704164645E9"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_normalize_date() {
        assert_eq!(normalize_date("2024-03-07"), "2024-03-07");
        assert_eq!(normalize_date("2024-03-07T10:00:00Z"), "2024-03-07");
        assert_eq!(normalize_date("n/a"), "n/a");
    }

    #[test]
    fn test_entry_savings_from_finding() {
        let entry = expensive_query_entry(record("job_1", Some("SELECT * FROM t"), 45.2));
        let finding = entry.finding.as_ref().unwrap();
        assert_eq!(finding.severity, Severity::High);
        assert_eq!(entry.potential_savings, 18.08);
    }

    #[test]
    fn test_entry_without_sql_has_no_finding() {
        let entry = expensive_query_entry(record("job_2", None, 12.0));
        assert!(entry.finding.is_none());
        assert_eq!(entry.potential_savings, 0.0);
        assert_eq!(entry.query_text, "");
    }

    #[test]
    fn test_entry_truncates_but_classifies_full_text() {
        let long_sql = format!("SELECT {} FROM t CROSS JOIN u", "col, ".repeat(60));
        let entry = expensive_query_entry(record("job_3", Some(&long_sql), 10.0));
        assert!(entry.query_text.ends_with(TRUNCATION_MARKER));
        assert_eq!(entry.query_text.chars().count(), MAX_QUERY_TEXT_CHARS + TRUNCATION_MARKER.len());
        assert_eq!(entry.finding.unwrap().severity, Severity::Critical);
    }

    #[test]
    fn test_rank_caps_at_twenty_and_is_stable() {
        let entries: Vec<_> = (0..25)
            .map(|i| expensive_query_entry(record(&format!("q{}", i), Some("SELECT a FROM t"), (i % 5) as f64)))
            .collect();
        let ranked = rank_expensive_queries(entries);
        assert_eq!(ranked.len(), MAX_RANKED_ROWS);
        assert_eq!(ranked[0].id, "q4");
        assert_eq!(ranked[1].id, "q9");
        assert!(ranked.windows(2).all(|w| w[0].cost >= w[1].cost));
    }

    #[test]
    fn test_apportion() {
        assert_eq!(apportion(25.0, 100.0, 800.0), 200.0);
        assert_eq!(apportion(10.0, 0.0, 800.0), 0.0);
        assert_eq!(apportion(0.0, 10.0, 800.0), 0.0);
    }
}
