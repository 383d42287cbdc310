//! Shapes exchanged with the protocol transport: listings, dispatch envelope
//! and typed tool arguments.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Scheme accepted in front of resource names (`finops://cost-summary`)
pub const RESOURCE_SCHEME: &str = "finops";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    ReadResource,
    CallTool,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::ReadResource => "read_resource",
            OperationKind::CallTool => "call_tool",
        }
    }
}

/// Generic dispatch envelope: `(operation_kind, identifier, arguments)`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DispatchRequest {
    pub kind: OperationKind,
    pub identifier: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[schema(value_type = Object)]
    pub input_schema: serde_json::Value,
}

// ========================================
// Tool arguments
// ========================================

fn default_true() -> bool {
    true
}

fn default_recommendation_days() -> u32 {
    7
}

fn default_min_cost() -> f64 {
    1.0
}

fn default_user_days() -> u32 {
    30
}

fn default_optimization_type() -> String {
    "all".to_string()
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AnalyzeQueryCostArgs {
    #[validate(length(min = 1, message = "query must not be empty"))]
    pub query: String,
    #[serde(default = "default_true")]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecommendationArgs {
    #[serde(default = "default_recommendation_days")]
    #[validate(range(min = 1, message = "days must be at least 1"))]
    pub days: u32,
    #[serde(default = "default_min_cost")]
    #[validate(range(min = 0.0, message = "min_cost must not be negative"))]
    pub min_cost: f64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CostByUserArgs {
    #[serde(default = "default_user_days")]
    #[validate(range(min = 1, message = "days must be at least 1"))]
    pub days: u32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NaturalLanguageArgs {
    #[validate(length(min = 1, message = "question must not be empty"))]
    pub question: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EstimateSavingsArgs {
    #[serde(default = "default_optimization_type")]
    pub optimization_type: String,
}
