//! Resource and tool catalog: identifiers, descriptions, input schemas

use serde_json::{Value, json};

use crate::models::{RESOURCE_SCHEME, ResourceDescriptor, ToolDescriptor};
use crate::services::recommendation_aggregator::optimization_types;
use crate::utils::{ApiError, ApiResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    CostSummary,
    ExpensiveQueries,
    ProjectCosts,
    CostTrends,
}

impl Resource {
    pub const ALL: [Resource; 4] =
        [Resource::CostSummary, Resource::ExpensiveQueries, Resource::ProjectCosts, Resource::CostTrends];

    pub fn name(&self) -> &'static str {
        match self {
            Resource::CostSummary => "cost-summary",
            Resource::ExpensiveQueries => "expensive-queries",
            Resource::ProjectCosts => "project-costs",
            Resource::CostTrends => "cost-trends",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Resource::CostSummary => "Total spend, query count and average cost over the last 30 days",
            Resource::ExpensiveQueries => {
                "Most expensive queries of the last 7 days with optimization findings"
            },
            Resource::ProjectCosts => "Cost per project, or storage size per database",
            Resource::CostTrends => "Daily cost (or CPU utilization) series, oldest first",
        }
    }

    pub fn uri(&self) -> String {
        format!("{}://{}", RESOURCE_SCHEME, self.name())
    }

    /// Accepts a bare name (`cost-summary`) or a URI (`finops://cost-summary`)
    pub fn resolve(identifier: &str) -> ApiResult<Self> {
        let name = match identifier.split_once("://") {
            Some((scheme, name)) if scheme == RESOURCE_SCHEME => name,
            Some(_) => return Err(ApiError::invalid_argument(format!("Unknown resource: {}", identifier))),
            None => identifier,
        };

        Self::ALL
            .into_iter()
            .find(|r| r.name() == name)
            .ok_or_else(|| ApiError::invalid_argument(format!("Unknown resource: {}", identifier)))
    }

    pub fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor {
            uri: self.uri(),
            name: self.name().to_string(),
            description: self.description().to_string(),
            mime_type: "application/json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    AnalyzeQueryCost,
    GetOptimizationRecommendations,
    GetCostByUser,
    NaturalLanguageToSql,
    EstimateSavings,
}

impl Tool {
    pub const ALL: [Tool; 5] = [
        Tool::AnalyzeQueryCost,
        Tool::GetOptimizationRecommendations,
        Tool::GetCostByUser,
        Tool::NaturalLanguageToSql,
        Tool::EstimateSavings,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Tool::AnalyzeQueryCost => "analyze_query_cost",
            Tool::GetOptimizationRecommendations => "get_optimization_recommendations",
            Tool::GetCostByUser => "get_cost_by_user",
            Tool::NaturalLanguageToSql => "natural_language_to_sql",
            Tool::EstimateSavings => "estimate_savings",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Tool::AnalyzeQueryCost => "Estimate the cost of a SQL query without running it",
            Tool::GetOptimizationRecommendations => {
                "Rank expensive queries by the savings their optimization would bring"
            },
            Tool::GetCostByUser => "Cost breakdown by user",
            Tool::NaturalLanguageToSql => "Translate a natural language question into SQL",
            Tool::EstimateSavings => "Estimate monthly savings per optimization technique",
        }
    }

    pub fn input_schema(&self) -> Value {
        match self {
            Tool::AnalyzeQueryCost => json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "The SQL query to analyze"},
                    "dry_run": {
                        "type": "boolean",
                        "description": "Estimate without executing (default: true)",
                        "default": true
                    }
                },
                "required": ["query"]
            }),
            Tool::GetOptimizationRecommendations => json!({
                "type": "object",
                "properties": {
                    "days": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "Number of days to analyze (default: 7)",
                        "default": 7
                    },
                    "min_cost": {
                        "type": "number",
                        "minimum": 0,
                        "description": "Minimum cost threshold in USD (default: 1.0)",
                        "default": 1.0
                    }
                }
            }),
            Tool::GetCostByUser => json!({
                "type": "object",
                "properties": {
                    "days": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "Number of days to analyze (default: 30)",
                        "default": 30
                    }
                }
            }),
            Tool::NaturalLanguageToSql => json!({
                "type": "object",
                "properties": {
                    "question": {"type": "string", "description": "Question in plain language"}
                },
                "required": ["question"]
            }),
            Tool::EstimateSavings => json!({
                "type": "object",
                "properties": {
                    "optimization_type": {
                        "type": "string",
                        "enum": optimization_types(),
                        "description": "Type of optimization to estimate (default: all)",
                        "default": "all"
                    }
                }
            }),
        }
    }

    pub fn resolve(name: &str) -> ApiResult<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| ApiError::invalid_argument(format!("Unknown tool: {}", name)))
    }

    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_resource_name_and_uri() {
        assert_eq!(Resource::resolve("cost-summary").unwrap(), Resource::CostSummary);
        assert_eq!(Resource::resolve("finops://cost-trends").unwrap(), Resource::CostTrends);
    }

    #[test]
    fn test_resolve_resource_rejects_foreign_scheme() {
        let err = Resource::resolve("bigquery://cost-summary").unwrap_err();
        assert!(err.to_string().contains("bigquery://cost-summary"));
    }

    #[test]
    fn test_unknown_tool_names_identifier() {
        let err = Tool::resolve("drop_everything").unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(_)));
        assert!(err.to_string().contains("drop_everything"));
    }

    #[test]
    fn test_schemas_are_objects() {
        for tool in Tool::ALL {
            assert_eq!(tool.input_schema()["type"], "object");
        }
        assert_eq!(Tool::AnalyzeQueryCost.input_schema()["required"][0], "query");
    }
}
