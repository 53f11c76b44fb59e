//! HTTP-level tests for the webhook router

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use lead_intake::dates::FixedClock;
use lead_intake::pipeline::LeadPipeline;
use lead_intake::routing::{AssigneeRouter, MirrorRule};
use lead_intake::server::{router, AppState};
use lead_intake::store::{MemoryStore, WorksheetSelector};

const HEADER: [&str; 4] = ["S.No", "Date", "Name", "Phone"];

fn app(store: Arc<MemoryStore>) -> axum::Router {
    let pipeline = LeadPipeline::new(
        store,
        AssigneeRouter::new(vec![MirrorRule::new("Dattu", "Dattu's leads")]),
        WorksheetSelector::First,
    )
    .unwrap();

    router(Arc::new(AppState {
        pipeline,
        clock: Arc::new(FixedClock(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())),
    }))
}

fn store() -> Arc<MemoryStore> {
    Arc::new(
        MemoryStore::new()
            .with_worksheet("Master", &HEADER, 100)
            .with_worksheet("Dattu's leads", &HEADER, 100),
    )
}

fn webhook(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_new_lead_returns_success() {
    let store = store();
    let body = json!({"raw_text": "Yesterday +91 98765 43210: hello", "assigned_to": "Dattu"}).to_string();

    let (status, json) = send(app(store.clone()), webhook(&body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"status": "success"}));
    assert_eq!(store.rows("Master")[1][1], "Jun 14, 2024");
    assert_eq!(store.rows("Dattu's leads").len(), 2);
}

#[tokio::test]
async fn test_duplicate_returns_ignored() {
    let store = store();
    let body = json!({"raw_text": "+91 98765 43210"}).to_string();

    let (first, _) = send(app(store.clone()), webhook(&body)).await;
    let (status, json) = send(app(store.clone()), webhook(&body)).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"status": "ignored", "message": "Duplicate found"}));
    assert_eq!(store.rows("Master").len(), 2);
}

#[tokio::test]
async fn test_missing_raw_text_is_bad_request() {
    let (status, json) = send(app(store()), webhook(r#"{"assigned_to": "Dattu"}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, json!({"status": "error", "message": "Missing raw_text"}));
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let (status, json) = send(app(store()), webhook("not json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Missing raw_text");
}

#[tokio::test]
async fn test_no_phone_is_bad_request() {
    let store = store();
    let (status, json) = send(app(store.clone()), webhook(r#"{"raw_text": "hi, call me later"}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, json!({"status": "error", "message": "No phone number found"}));
    assert_eq!(store.rows("Master").len(), 1);
}

#[tokio::test]
async fn test_store_failure_is_server_error() {
    let store = store();
    store.fail_writes_to("Master");

    let (status, json) = send(app(store), webhook(r#"{"raw_text": "+91 98765 43210"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["status"], "error");
    assert!(json["message"].as_str().unwrap().contains("unavailable"));
}

#[tokio::test]
async fn test_mirror_failure_still_succeeds() {
    let store = store();
    store.fail_writes_to("Dattu's leads");
    let body = json!({"raw_text": "+91 98765 43210", "assigned_to": "Dattu"}).to_string();

    let (status, json) = send(app(store.clone()), webhook(&body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"status": "success"}));
    assert_eq!(store.rows("Master").len(), 2);
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, json) = send(app(store()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"status": "ok"}));
}
