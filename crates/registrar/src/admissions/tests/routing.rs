use super::common::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::admissions::admission_router;

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn scores_endpoint_returns_the_evaluation() {
    let fixture = fixture();
    let application = submit(&fixture);
    let app = admission_router(Arc::clone(&fixture.service));

    let payload = json!([
        { "criteria_id": fixture.interview, "user_id": fixture.evaluator, "score": 90, "is_posted": true },
        { "criteria_id": fixture.exam, "user_id": fixture.evaluator, "score": 45, "is_posted": true }
    ]);
    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/v1/admission-applications/{}/scores", application))
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["evaluation"]["is_passing"], Value::Bool(true));
    assert_eq!(body["scores"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn manual_acceptance_is_unprocessable() {
    let fixture = fixture();
    let application = submit(&fixture);
    let app = admission_router(Arc::clone(&fixture.service));

    let payload = json!({ "status": "accepted", "user_id": fixture.chair });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/v1/admission-applications/{}/logs", application))
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json(response).await;
    assert_eq!(
        body["error"],
        Value::String("status accepted is recorded automatically".to_string())
    );
}

#[tokio::test]
async fn unknown_application_is_not_found() {
    let fixture = fixture();
    let app = admission_router(Arc::clone(&fixture.service));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/admission-applications/404/evaluation")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn submitting_through_the_router_creates() {
    let fixture = fixture();
    let app = admission_router(Arc::clone(&fixture.service));

    let payload = json!({
        "user_id": fixture.applicant,
        "admission_schedule_id": fixture.schedule,
        "first_name": "Jose",
        "last_name": "Rizal",
        "email": "jose@example.com"
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/admission-applications")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    assert_eq!(body["pool_no"], json!(1));
    assert_eq!(body["latest_status"], json!("submitted"));
}
