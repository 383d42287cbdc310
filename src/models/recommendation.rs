use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use super::Severity;

/// Read-only projection of an expensive query, produced by the aggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Recommendation {
    pub query_id: String,
    pub current_cost: f64,
    /// Suggestion of the underlying finding
    pub optimization: Option<String>,
    pub estimated_savings: f64,
    pub severity: Option<Severity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecommendationReport {
    /// Savings over every query at or above the cost threshold
    pub total_potential_savings: f64,
    pub queries_analyzed: usize,
    /// At most ten entries, highest savings first
    pub top_recommendations: Vec<Recommendation>,
}

impl RecommendationReport {
    pub fn empty() -> Self {
        Self { total_potential_savings: 0.0, queries_analyzed: 0, top_recommendations: Vec::new() }
    }
}

/// Savings catalogue entry for one optimization technique
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SavingsEstimate {
    pub monthly_savings: f64,
    pub description: String,
}

/// `estimate_savings` result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SavingsEstimateReport {
    All { total_monthly_savings: f64, breakdown: BTreeMap<String, SavingsEstimate> },
    Single(SavingsEstimate),
    Failed { error: String },
}
