pub mod dispatch;
pub mod health;
pub mod resources;
pub mod tools;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::AppState;

/// Routes served by the process, without documentation or tower layers
pub fn routes(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Resources
        .route("/api/resources", get(resources::list_resources))
        .route("/api/resources/:name", get(resources::read_resource))
        // Tools
        .route("/api/tools", get(tools::list_tools))
        .route("/api/tools/:name", post(tools::call_tool))
        // Generic envelope
        .route("/api/dispatch", post(dispatch::dispatch))
        .with_state(Arc::clone(&state));

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .with_state(state);

    Router::new().merge(api_routes).merge(health_routes)
}
