//! REST routes exercised through the full router.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{app_state, FakeBackend};
use gateway_lib::web::router;
use learning_engine_core::LearnerProgress;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn health_reports_ok() {
    let backend = FakeBackend::new();
    let app = router(Arc::new(app_state(&backend)));

    let (status, body) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn learner_progress_is_proxied_from_the_backend() {
    let backend = FakeBackend::new();
    let learner_id = Uuid::new_v4();
    backend.progress.lock().unwrap().insert(
        learner_id,
        LearnerProgress {
            learner_id,
            total_xp: 250,
            coins: 90,
            lessons_completed: 25,
        },
    );
    let app = router(Arc::new(app_state(&backend)));

    let (status, body) = get(app, &format!("/learners/{}/progress", learner_id)).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["total_xp"], 250);
    assert_eq!(json["lessons_completed"], 25);
}

#[tokio::test]
async fn backend_failures_map_to_http_statuses() {
    let backend = FakeBackend::new();
    let state = Arc::new(app_state(&backend));

    let (status, _) = get(
        router(state.clone()),
        &format!("/learners/{}/progress", Uuid::new_v4()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    backend.set_offline(true);
    let (status, _) = get(
        router(state.clone()),
        &format!("/learners/{}/progress", Uuid::new_v4()),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _) = get(router(state), "/learners/not-a-uuid/progress").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let backend = FakeBackend::new();
    let app = router(Arc::new(app_state(&backend)));

    let (status, body) = get(app, "/api-docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["paths"]["/health"].is_object());
    assert!(json["paths"]["/learners/{learner_id}/progress"].is_object());
}
