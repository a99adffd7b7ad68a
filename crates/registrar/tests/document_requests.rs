//! Document requests from filing to pickup.

mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{campus, send, Campus};

async fn file_request(world: &Campus, price_cents: u64) -> Value {
    let (status, document_type) = send(
        world.app(),
        "POST",
        "/api/v1/document-types",
        Some(json!({ "name": format!("Transcript of Records {price_cents}"), "price_cents": price_cents })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, request) = send(
        world.app(),
        "POST",
        "/api/v1/document-requests",
        Some(json!({
            "user_id": world.student,
            "campus_id": world.campus,
            "document_type_id": document_type["id"],
            "purpose": "Graduate school application"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    request
}

#[tokio::test]
async fn free_documents_skip_payment_and_notify_at_pickup() {
    let world = campus();
    let request = file_request(&world, 0).await;
    assert_eq!(request["latest_status"], "paid");
    let logs = format!("/api/v1/document-requests/{}/logs", request["id"]);

    for action in ["processing", "pickup"] {
        let (status, _) = send(
            world.app(),
            "POST",
            &logs,
            Some(json!({ "action": action, "user_id": world.staff })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{action}");
    }

    let (_, history) = send(world.app(), "GET", &logs, None).await;
    let history = history.as_array().expect("logs");
    assert_eq!(history.len(), 4);
    assert_eq!(history[1]["note"], "Payment not required (free document)");

    let (_, unread) = send(
        world.app(),
        "GET",
        &format!("/api/v1/users/{}/notifications?unread=true", world.student),
        None,
    )
    .await;
    let unread = unread.as_array().expect("notifications");
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0]["kind"], "document_ready");

    let (status, read) = send(
        world.app(),
        "POST",
        &format!("/api/v1/notifications/{}/read", unread[0]["id"]),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read["is_read"], Value::Bool(true));
}

#[tokio::test]
async fn priced_documents_cannot_jump_to_pickup() {
    let world = campus();
    let request = file_request(&world, 25_000).await;
    assert_eq!(request["latest_status"], "submitted");

    let (status, body) = send(
        world.app(),
        "POST",
        &format!("/api/v1/document-requests/{}/logs", request["id"]),
        Some(json!({ "action": "pickup", "user_id": world.staff })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["error"],
        "cannot move document request from submitted to pickup"
    );
}
