use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::AppState;
use crate::services::DispatcherState;

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    pub backend: String,
    pub state: DispatcherState,
    pub live_data: bool,
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Process is up", body = String)),
    tag = "System"
)]
pub async fn health_check() -> &'static str {
    "OK"
}

// Ready once the dispatcher is initialized, live or degraded
#[utoipa::path(
    get,
    path = "/ready",
    responses(
        (status = 200, description = "Serving requests", body = ReadyResponse),
        (status = 503, description = "Dispatcher not initialized", body = ReadyResponse)
    ),
    tag = "System"
)]
pub async fn ready_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ReadyResponse>) {
    let dispatcher_state = state.dispatcher.state();
    let status = match dispatcher_state {
        DispatcherState::Uninitialized => StatusCode::SERVICE_UNAVAILABLE,
        DispatcherState::Ready | DispatcherState::Degraded => StatusCode::OK,
    };

    (
        status,
        Json(ReadyResponse {
            backend: state.dispatcher.backend_kind().as_str().to_string(),
            state: dispatcher_state,
            live_data: dispatcher_state == DispatcherState::Ready,
        }),
    )
}
