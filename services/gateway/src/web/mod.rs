pub mod command_pump;
pub mod diagnostic_flow;
pub mod lesson_flow;
pub mod protocol;
pub mod rest;
pub mod review_flow;
pub mod state;
pub mod ws_handler;

use std::sync::Arc;

use axum::{routing::get, Router};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use state::AppState;

pub use rest::{health_handler, learner_progress_handler, ApiDoc};
pub use ws_handler::ws_handler;

/// Builds the full router: REST endpoints, the session WebSocket and Swagger UI.
pub fn router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/health", get(health_handler))
        .route("/learners/{learner_id}/progress", get(learner_progress_handler))
        .route("/ws", get(ws_handler))
        .with_state(app_state);

    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
