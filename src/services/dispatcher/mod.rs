//! Request dispatcher
//!
//! Resolves `(operation kind, identifier, arguments)` to a backend call and
//! runs every operation through [`Dispatcher::guarded`], the single place where
//! failures are logged before being returned to the transport.

mod catalog;

pub use catalog::{Resource, Tool};

use std::future::Future;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use validator::Validate;

use crate::config::BackendKind;
use crate::models::{
    AnalyzeQueryCostArgs, CostByUserArgs, EstimateSavingsArgs, NaturalLanguageArgs,
    OperationKind, RecommendationArgs, ResourceDescriptor, ToolDescriptor,
};
use crate::services::cost_backend::{CostBackend, DEFAULT_EXPENSIVE_QUERY_DAYS};
use crate::services::recommendation_aggregator::{aggregate, estimate_savings};
use crate::utils::{ApiError, ApiResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DispatcherState {
    /// `initialize` has not run yet
    Uninitialized,
    /// Backend connected, live data
    Ready,
    /// Backend connection failed, fallback data
    Degraded,
}

pub struct Dispatcher {
    backend: Arc<dyn CostBackend>,
    state: OnceCell<DispatcherState>,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn CostBackend>) -> Self {
        Self { backend, state: OnceCell::new() }
    }

    /// Connect the backend once. A failed connection degrades the dispatcher
    /// to fallback data instead of failing.
    pub async fn initialize(&self) -> DispatcherState {
        if let Some(state) = self.state.get() {
            return *state;
        }

        let state = match self.backend.connect().await {
            Ok(()) => {
                tracing::info!("Dispatcher ready with {} backend", self.backend.kind().as_str());
                DispatcherState::Ready
            },
            Err(e) => {
                tracing::warn!(
                    "{} backend unavailable, serving fallback data: {}",
                    self.backend.kind().as_str(),
                    e
                );
                DispatcherState::Degraded
            },
        };

        *self.state.get_or_init(|| state)
    }

    pub fn state(&self) -> DispatcherState {
        self.state.get().copied().unwrap_or(DispatcherState::Uninitialized)
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn list_resources(&self) -> Vec<ResourceDescriptor> {
        Resource::ALL.iter().map(Resource::descriptor).collect()
    }

    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        Tool::ALL.iter().map(Tool::descriptor).collect()
    }

    pub async fn dispatch(
        &self,
        kind: OperationKind,
        identifier: &str,
        arguments: &Map<String, Value>,
    ) -> ApiResult<Value> {
        match kind {
            OperationKind::ReadResource => self.read_resource(identifier).await,
            OperationKind::CallTool => self.call_tool(identifier, arguments).await,
        }
    }

    pub async fn read_resource(&self, identifier: &str) -> ApiResult<Value> {
        let operation = format!("{} {}", OperationKind::ReadResource.as_str(), identifier);
        self.guarded(&operation, async {
            let backend = &self.backend;
            match Resource::resolve(identifier)? {
                Resource::CostSummary => to_json(backend.get_cost_summary().await?),
                Resource::ExpensiveQueries => {
                    to_json(backend.get_expensive_queries(DEFAULT_EXPENSIVE_QUERY_DAYS).await?)
                },
                Resource::ProjectCosts => to_json(backend.get_project_costs().await?),
                Resource::CostTrends => to_json(backend.get_cost_trends().await?),
            }
        })
        .await
    }

    pub async fn call_tool(&self, name: &str, arguments: &Map<String, Value>) -> ApiResult<Value> {
        let operation = format!("{} {}", OperationKind::CallTool.as_str(), name);
        self.guarded(&operation, async {
            let backend = &self.backend;
            match Tool::resolve(name)? {
                Tool::AnalyzeQueryCost => {
                    let args: AnalyzeQueryCostArgs = validated_args(name, arguments)?;
                    to_json(backend.analyze_query_cost(&args.query, args.dry_run).await?)
                },
                Tool::GetOptimizationRecommendations => {
                    let args: RecommendationArgs = validated_args(name, arguments)?;
                    let entries = backend.get_expensive_queries(args.days).await?;
                    to_json(aggregate(&entries, args.min_cost))
                },
                Tool::GetCostByUser => {
                    let args: CostByUserArgs = validated_args(name, arguments)?;
                    to_json(backend.get_cost_by_user(args.days).await?)
                },
                Tool::NaturalLanguageToSql => {
                    let args: NaturalLanguageArgs = validated_args(name, arguments)?;
                    to_json(backend.natural_language_to_sql(&args.question).await?)
                },
                Tool::EstimateSavings => {
                    let args: EstimateSavingsArgs = parse_args(name, arguments)?;
                    to_json(estimate_savings(&args.optimization_type))
                },
            }
        })
        .await
    }

    /// Fault wrapper: rejects calls before initialization and logs every
    /// failure with the operation name and error class. Errors are returned
    /// unchanged.
    async fn guarded<F>(&self, operation: &str, fut: F) -> ApiResult<Value>
    where
        F: Future<Output = ApiResult<Value>>,
    {
        let result = match self.state() {
            DispatcherState::Uninitialized => {
                Err(ApiError::connection_unavailable("Dispatcher has not been initialized"))
            },
            DispatcherState::Ready | DispatcherState::Degraded => fut.await,
        };

        if let Err(e) = &result {
            match e {
                ApiError::InvalidArgument(_) | ApiError::Unsupported(_) => {
                    tracing::warn!("Operation '{}' rejected [{}]: {}", operation, e.kind(), e)
                },
                ApiError::ConnectionUnavailable(_) => {
                    tracing::error!("Operation '{}' without connection [{}]: {}", operation, e.kind(), e)
                },
                ApiError::BackendFailure(_) | ApiError::InternalError(_) => {
                    tracing::error!("Operation '{}' failed [{}]: {}", operation, e.kind(), e)
                },
            }
        } else {
            tracing::debug!("Operation '{}' succeeded", operation);
        }

        result
    }
}

fn to_json<T: Serialize>(value: T) -> ApiResult<Value> {
    Ok(serde_json::to_value(value)?)
}

fn parse_args<T: DeserializeOwned>(tool: &str, arguments: &Map<String, Value>) -> ApiResult<T> {
    serde_json::from_value(Value::Object(arguments.clone())).map_err(|e| {
        ApiError::invalid_argument(format!("Invalid arguments for {}: {}", tool, e))
    })
}

fn validated_args<T: DeserializeOwned + Validate>(
    tool: &str,
    arguments: &Map<String, Value>,
) -> ApiResult<T> {
    let args: T = parse_args(tool, arguments)?;
    args.validate()?;
    Ok(args)
}
