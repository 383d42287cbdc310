use axum::{Json, extract::State};
use serde_json::Value;
use std::sync::Arc;

use crate::AppState;
use crate::models::DispatchRequest;
use crate::utils::ApiResult;

// Generic (operation kind, identifier, arguments) envelope
#[utoipa::path(
    post,
    path = "/api/dispatch",
    request_body = DispatchRequest,
    responses(
        (status = 200, description = "Resource content or tool result"),
        (status = 400, description = "Unknown identifier or invalid arguments", body = crate::utils::error::ErrorBody),
        (status = 502, description = "Backend failure", body = crate::utils::error::ErrorBody),
        (status = 503, description = "Dispatcher not initialized", body = crate::utils::error::ErrorBody)
    ),
    tag = "Dispatch"
)]
pub async fn dispatch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DispatchRequest>,
) -> ApiResult<Json<Value>> {
    tracing::debug!("Dispatch request: {} {}", req.kind.as_str(), req.identifier);
    let result = state
        .dispatcher
        .dispatch(req.kind, &req.identifier, &req.arguments)
        .await?;
    Ok(Json(result))
}
