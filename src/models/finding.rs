use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Severity of an optimization finding, ordered from least to most urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the optimization rule classifier for one query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OptimizationFinding {
    pub suggestion: String,
    pub severity: Severity,
    /// Estimated share of the query cost that the suggestion saves (0-100)
    pub savings_percent: u8,
}

impl OptimizationFinding {
    pub fn new(suggestion: impl Into<String>, severity: Severity, savings_percent: u8) -> Self {
        Self { suggestion: suggestion.into(), severity, savings_percent: savings_percent.min(100) }
    }

    /// Informational finding with no savings, used when no real estimate exists
    pub fn informational(suggestion: impl Into<String>) -> Self {
        Self::new(suggestion, Severity::Info, 0)
    }

    /// Savings in cost units for a query of the given cost
    pub fn savings_for(&self, cost: f64) -> f64 {
        cost * f64::from(self.savings_percent) / 100.0
    }
}
