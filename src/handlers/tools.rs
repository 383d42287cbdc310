use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::AppState;
use crate::models::ToolDescriptor;
use crate::utils::{ApiError, ApiResult};

// List callable tools with their JSON input schemas
#[utoipa::path(
    get,
    path = "/api/tools",
    responses(
        (status = 200, description = "Tool descriptors", body = [ToolDescriptor])
    ),
    tag = "Tools"
)]
pub async fn list_tools(State(state): State<Arc<AppState>>) -> Json<Vec<ToolDescriptor>> {
    Json(state.dispatcher.list_tools())
}

// Call a tool; the body is the argument object and may be empty
#[utoipa::path(
    post,
    path = "/api/tools/{name}",
    params(
        ("name" = String, Path, description = "Tool name, e.g. analyze_query_cost")
    ),
    request_body(content = Object, description = "Tool arguments", content_type = "application/json"),
    responses(
        (status = 200, description = "Tool result"),
        (status = 400, description = "Unknown tool or invalid arguments", body = crate::utils::error::ErrorBody),
        (status = 502, description = "Backend failure", body = crate::utils::error::ErrorBody),
        (status = 503, description = "Dispatcher not initialized", body = crate::utils::error::ErrorBody)
    ),
    tag = "Tools"
)]
pub async fn call_tool(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let arguments = parse_arguments(&body)?;
    tracing::debug!("Call tool request: {} ({} arguments)", name, arguments.len());
    let result = state.dispatcher.call_tool(&name, &arguments).await?;
    Ok(Json(result))
}

/// Empty body means no arguments; anything else must be a JSON object
fn parse_arguments(body: &[u8]) -> ApiResult<Map<String, Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(_) => Err(ApiError::invalid_argument("Tool arguments must be a JSON object")),
        Err(e) => Err(ApiError::invalid_argument(format!("Malformed JSON body: {}", e))),
    }
}
