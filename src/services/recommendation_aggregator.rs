//! Recommendation aggregator
//!
//! Turns classified expensive queries into a top-N savings report, and serves
//! the static savings catalogue behind `estimate_savings`.

use std::collections::BTreeMap;

use crate::models::{
    ExpensiveQueryEntry, Recommendation, RecommendationReport, SavingsEstimate,
    SavingsEstimateReport,
};
use crate::utils::{round_to, top_n_desc_by};

/// Maximum recommendations in one report
pub const MAX_RECOMMENDATIONS: usize = 10;

/// Anything that can be ranked by the savings it would bring
pub trait SavingsCandidate {
    fn cost(&self) -> f64;
    fn potential_savings(&self) -> f64;
    fn to_recommendation(&self) -> Recommendation;
}

impl SavingsCandidate for ExpensiveQueryEntry {
    fn cost(&self) -> f64 {
        self.cost
    }

    fn potential_savings(&self) -> f64 {
        self.potential_savings
    }

    fn to_recommendation(&self) -> Recommendation {
        Recommendation {
            query_id: self.id.clone(),
            current_cost: self.cost,
            optimization: self.finding.as_ref().map(|f| f.suggestion.clone()),
            estimated_savings: self.potential_savings,
            severity: self.finding.as_ref().map(|f| f.severity),
        }
    }
}

impl SavingsCandidate for Recommendation {
    fn cost(&self) -> f64 {
        self.current_cost
    }

    fn potential_savings(&self) -> f64 {
        self.estimated_savings
    }

    fn to_recommendation(&self) -> Recommendation {
        self.clone()
    }
}

/// Drop candidates below `min_cost`, rank the rest by savings (stable on ties)
/// and keep the top [`MAX_RECOMMENDATIONS`]. The total covers every candidate
/// that passed the filter, not only the ones listed.
pub fn aggregate<T: SavingsCandidate>(entries: &[T], min_cost: f64) -> RecommendationReport {
    let filtered: Vec<&T> = entries.iter().filter(|e| e.cost() >= min_cost).collect();
    if filtered.is_empty() {
        return RecommendationReport::empty();
    }

    let total: f64 = filtered.iter().map(|e| e.potential_savings()).sum();
    let queries_analyzed = filtered.len();
    let top_recommendations =
        top_n_desc_by(filtered, MAX_RECOMMENDATIONS, |e| e.potential_savings())
            .into_iter()
            .map(|e| e.to_recommendation())
            .collect();

    RecommendationReport {
        total_potential_savings: round_to(total, 2),
        queries_analyzed,
        top_recommendations,
    }
}

// ========================================
// Savings catalogue
// ========================================

pub const ALL_OPTIMIZATIONS: &str = "all";

const CATALOGUE: [(&str, f64, &str); 4] = [
    ("partitioning", 120.00, "Add date-based partitioning"),
    ("clustering", 70.00, "Add clustering keys on filtered columns"),
    ("materialized_views", 55.00, "Cache frequently aggregated results"),
    ("query_optimization", 95.00, "Replace SELECT * with specific columns"),
];

/// Names accepted by [`estimate_savings`], `all` included
pub fn optimization_types() -> Vec<&'static str> {
    CATALOGUE.iter().map(|(name, _, _)| *name).chain([ALL_OPTIMIZATIONS]).collect()
}

fn catalogue_entry(monthly_savings: f64, description: &str) -> SavingsEstimate {
    SavingsEstimate { monthly_savings, description: description.to_string() }
}

/// Static monthly savings per technique. An unknown type is reported in-band.
pub fn estimate_savings(optimization_type: &str) -> SavingsEstimateReport {
    if optimization_type == ALL_OPTIMIZATIONS {
        let breakdown: BTreeMap<String, SavingsEstimate> = CATALOGUE
            .iter()
            .map(|(name, savings, description)| {
                (name.to_string(), catalogue_entry(*savings, description))
            })
            .collect();
        let total = breakdown.values().map(|e| e.monthly_savings).sum();
        return SavingsEstimateReport::All {
            total_monthly_savings: round_to(total, 2),
            breakdown,
        };
    }

    match CATALOGUE.iter().find(|(name, _, _)| *name == optimization_type) {
        Some((_, savings, description)) => {
            SavingsEstimateReport::Single(catalogue_entry(*savings, description))
        },
        None => SavingsEstimateReport::Failed {
            error: format!("Unknown optimization type: {}", optimization_type),
        },
    }
}
