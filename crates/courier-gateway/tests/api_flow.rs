// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! API tests driving the real router with in-memory requests: auth
//! enforcement, the bulk-send flow, cancellation, logs, and the session
//! lifecycle endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use courier_config::model::WorkerConfig;
use courier_dispatch::BulkIntake;
use courier_gateway::{build_router, GatewayState};
use courier_storage::models::WorkerSession;
use courier_storage::queries::sessions;
use courier_test_utils::{MockRuntime, StorageHarness, TEST_SESSION};
use courier_worker::WorkerController;

const TOKEN: &str = "token-harness";

struct Api {
    router: Router,
    harness: StorageHarness,
    runtime: Arc<MockRuntime>,
}

async fn setup() -> Api {
    let harness = StorageHarness::new().await.unwrap();
    let runtime = Arc::new(MockRuntime::new());

    let controller = Arc::new(
        WorkerController::new(
            runtime.clone(),
            harness.db.clone(),
            harness.clock.clone(),
            WorkerConfig::default(),
        )
        .with_poll_interval(Duration::from_millis(5)),
    );
    let intake = Arc::new(BulkIntake::new(
        harness.db.clone(),
        harness.gateway.clone(),
        harness.clock.clone(),
    ));

    let state = GatewayState {
        db: harness.db.clone(),
        intake,
        controller,
        clock: harness.clock.clone(),
        start_time: std::time::Instant::now(),
    };

    Api {
        router: build_router(state),
        harness,
        runtime,
    }
}

fn authed(request: Request<Body>) -> Request<Body> {
    let (mut parts, body) = request.into_parts();
    parts.headers.insert(
        header::AUTHORIZATION,
        format!("Bearer {TOKEN}").parse().unwrap(),
    );
    Request::from_parts(parts, body)
}

fn get(path: &str) -> Request<Body> {
    authed(
        Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap(),
    )
}

fn delete(path: &str) -> Request<Body> {
    authed(
        Request::builder()
            .method("DELETE")
            .uri(path)
            .body(Body::empty())
            .unwrap(),
    )
}

fn post_json(path: &str, body: serde_json::Value) -> Request<Body> {
    authed(
        Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let api = setup().await;
    let response = api
        .router
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn v1_routes_reject_missing_or_unknown_tokens() {
    let api = setup().await;

    let response = api
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/scheduled")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = api
        .router
        .oneshot(
            Request::builder()
                .uri("/v1/scheduled")
                .header(header::AUTHORIZATION, "Bearer wrong-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bulk_send_schedules_and_batch_status_reflects_it() {
    let api = setup().await;

    let response = api
        .router
        .clone()
        .oneshot(post_json(
            "/v1/bulk-send",
            serde_json::json!({
                "session_name": TEST_SESSION,
                "messages": [
                    {"recipient": "+1", "message": "hi {name}", "name": "A", "delay_seconds": 30},
                    {"recipient": "+2", "message": "hi {name}", "name": "B", "delay_seconds": 60},
                ],
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["scheduled"], true);
    assert_eq!(body["total"], 2);
    let batch_id = body["batch_id"].as_str().unwrap().to_string();

    // Listing shows both rows pending.
    let response = api
        .router
        .clone()
        .oneshot(get("/v1/scheduled?status=pending"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["count"], 2);

    // Batch status carries zeroes for absent states.
    let response = api
        .router
        .clone()
        .oneshot(get(&format!("/v1/batch/{batch_id}")))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["status"]["pending"], 2);
    assert_eq!(body["status"]["sent"], 0);
    assert_eq!(body["status"]["cancelled"], 0);

    // Cancel the whole batch.
    let response = api
        .router
        .clone()
        .oneshot(delete(&format!("/v1/batch/{batch_id}")))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["cancelled"], 2);
}

#[tokio::test]
async fn bulk_send_immediate_returns_per_item_results() {
    let api = setup().await;

    let response = api
        .router
        .clone()
        .oneshot(post_json(
            "/v1/bulk-send",
            serde_json::json!({
                "session_name": TEST_SESSION,
                "messages": [
                    {"recipient": "+1", "message": "one"},
                    {"recipient": "+2", "message": "two"},
                ],
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["scheduled"], false);
    assert_eq!(body["success_count"], 2);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    assert_eq!(api.harness.gateway.call_count(), 2);

    // The attempts are visible in the logs and stats.
    let response = api
        .router
        .clone()
        .oneshot(get("/v1/message-logs?limit=10"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["total"], 2);

    let response = api
        .router
        .oneshot(get("/v1/message-logs/stats"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["sent"], 2);
}

#[tokio::test]
async fn bulk_send_to_unknown_session_is_a_400() {
    let api = setup().await;
    let response = api
        .router
        .oneshot(post_json(
            "/v1/bulk-send",
            serde_json::json!({
                "session_name": "wk-ghost",
                "messages": [{"recipient": "+1", "message": "hi"}],
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("unknown session"));
}

#[tokio::test]
async fn cancel_message_then_cancel_again_is_a_400() {
    let api = setup().await;

    api.router
        .clone()
        .oneshot(post_json(
            "/v1/bulk-send",
            serde_json::json!({
                "session_name": TEST_SESSION,
                "messages": [{"recipient": "+1", "message": "later", "delay_seconds": 120}],
            }),
        ))
        .await
        .unwrap();

    let response = api
        .router
        .clone()
        .oneshot(get("/v1/scheduled"))
        .await
        .unwrap();
    let body = json_body(response).await;
    let message_id = body["messages"][0]["id"].as_str().unwrap().to_string();

    let response = api
        .router
        .clone()
        .oneshot(delete(&format!("/v1/scheduled/{message_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = api
        .router
        .oneshot(delete(&format!("/v1/scheduled/{message_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("already processed"));
}

#[tokio::test]
async fn session_lifecycle_over_http() {
    let api = setup().await;

    let response = api
        .router
        .clone()
        .oneshot(post_json(
            "/v1/sessions",
            serde_json::json!({"name": "primary"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["status"], "initializing");
    let session_id = body["session_id"].as_str().unwrap().to_string();
    assert!(body["base_url"].as_str().unwrap().contains(&session_id));
    assert!(api.runtime.exists(&session_id));

    let response = api
        .router
        .clone()
        .oneshot(get(&format!("/v1/sessions/{session_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["worker_status"], "initializing");

    let response = api
        .router
        .clone()
        .oneshot(delete(&format!("/v1/sessions/{session_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!api.runtime.exists(&session_id));

    // Deleted sessions drop out of the listing.
    let response = api
        .router
        .clone()
        .oneshot(get("/v1/sessions"))
        .await
        .unwrap();
    let body = json_body(response).await;
    let listed: Vec<&str> = body["sessions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["session_id"].as_str().unwrap())
        .collect();
    assert!(!listed.contains(&session_id.as_str()));
}

#[tokio::test]
async fn tenants_cannot_see_each_others_messages() {
    let api = setup().await;
    api.harness.create_user("u-other", 100).await.unwrap();
    sessions::create_session(
        &api.harness.db,
        &WorkerSession {
            session_id: "wk-other".to_string(),
            user_id: "u-other".to_string(),
            name: "other".to_string(),
            status: "ready".to_string(),
            base_url: None,
            created_at: "2026-03-01T09:00:00.000Z".to_string(),
            updated_at: "2026-03-01T09:00:00.000Z".to_string(),
        },
    )
    .await
    .unwrap();

    // The other tenant schedules a message.
    let response = api
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/bulk-send")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, "Bearer token-u-other")
                .body(Body::from(
                    serde_json::json!({
                        "session_name": "wk-other",
                        "messages": [{"recipient": "+9", "message": "secret", "delay_seconds": 60}],
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The default tenant sees none of it.
    let response = api
        .router
        .oneshot(get("/v1/scheduled"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["count"], 0);
}
