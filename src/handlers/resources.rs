use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::Value;
use std::sync::Arc;

use crate::AppState;
use crate::models::ResourceDescriptor;
use crate::utils::ApiResult;

// List readable resources
#[utoipa::path(
    get,
    path = "/api/resources",
    responses(
        (status = 200, description = "Resource descriptors", body = [ResourceDescriptor])
    ),
    tag = "Resources"
)]
pub async fn list_resources(State(state): State<Arc<AppState>>) -> Json<Vec<ResourceDescriptor>> {
    Json(state.dispatcher.list_resources())
}

// Read one resource by name or finops:// URI
#[utoipa::path(
    get,
    path = "/api/resources/{name}",
    params(
        ("name" = String, Path, description = "Resource name, e.g. cost-summary")
    ),
    responses(
        (status = 200, description = "Resource content"),
        (status = 400, description = "Unknown resource", body = crate::utils::error::ErrorBody),
        (status = 502, description = "Backend failure", body = crate::utils::error::ErrorBody),
        (status = 503, description = "Dispatcher not initialized", body = crate::utils::error::ErrorBody)
    ),
    tag = "Resources"
)]
pub async fn read_resource(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<Value>> {
    tracing::debug!("Read resource request: {}", name);
    let content = state.dispatcher.read_resource(&name).await?;
    Ok(Json(content))
}
