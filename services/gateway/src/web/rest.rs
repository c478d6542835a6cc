//! services/gateway/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use learning_engine_core::ports::PortError;
use serde::Serialize;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::web::state::AppState;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        learner_progress_handler,
    ),
    components(
        schemas(HealthResponse, ProgressResponse)
    ),
    tags(
        (name = "Learning Gateway API", description = "Endpoints for the learning session gateway. Sessions themselves run over the /ws WebSocket.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema, Debug)]
pub struct HealthResponse {
    pub status: String,
}

/// A learner's totals as confirmed by the backend.
#[derive(Serialize, ToSchema, Debug)]
pub struct ProgressResponse {
    pub learner_id: Uuid,
    pub total_xp: u64,
    pub coins: u64,
    pub lessons_completed: u32,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "The gateway is running", body = HealthResponse)
    )
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Fetch a learner's confirmed progress from the backend.
#[utoipa::path(
    get,
    path = "/learners/{learner_id}/progress",
    params(
        ("learner_id" = Uuid, Path, description = "The unique ID of the learner.")
    ),
    responses(
        (status = 200, description = "Learner progress", body = ProgressResponse),
        (status = 404, description = "Unknown learner"),
        (status = 502, description = "The backend returned an unexpected response"),
        (status = 503, description = "The backend is unavailable")
    )
)]
pub async fn learner_progress_handler(
    State(app_state): State<Arc<AppState>>,
    Path(learner_id): Path<Uuid>,
) -> Result<Json<ProgressResponse>, (StatusCode, String)> {
    match app_state.progress.fetch_progress(learner_id).await {
        Ok(progress) => Ok(Json(ProgressResponse {
            learner_id: progress.learner_id,
            total_xp: progress.total_xp,
            coins: progress.coins,
            lessons_completed: progress.lessons_completed,
        })),
        Err(e) => {
            error!(%learner_id, "Failed to fetch learner progress: {:?}", e);
            let status = match e {
                PortError::NotFound(_) => StatusCode::NOT_FOUND,
                PortError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                PortError::Unexpected(_) => StatusCode::BAD_GATEWAY,
            };
            Err((status, e.to_string()))
        }
    }
}
