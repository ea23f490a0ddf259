//! HTTP surface tests against in-memory stores.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::{request, MockRequestStore, MockRosterStore};
use serde_json::{json, Value};
use tower::ServiceExt;

use passdesk::api::create_router;
use passdesk::model::Status;
use passdesk::pdf::{LocalChromium, PdfRenderer, ReportTemplate};
use passdesk::state::AppState;

fn test_app(store: MockRequestStore, roster: MockRosterStore) -> Router {
    let renderer = PdfRenderer::new(
        Box::new(LocalChromium { executable: None }),
        Duration::from_secs(5),
    );
    let state = AppState::new(
        Arc::new(store),
        Arc::new(roster),
        renderer,
        ReportTemplate::new().unwrap(),
    );
    create_router(state)
}

fn default_app() -> Router {
    let store = MockRequestStore::new(vec![
        request("a", "2024-01-05", "Anna Smirnova", Status::Pending, "MGM-101", "Management"),
        request("b", "2024-01-10", "Boris Petrov", Status::Approved, "MGM-101", "Management"),
    ]);
    let roster = MockRosterStore::new(&[
        ("Anna Smirnova", "MGM-101"),
        ("Boris Petrov", "MGM-101"),
    ]);
    test_app(store, roster)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let response = default_app().oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn list_returns_requests_newest_first() {
    let response = default_app().oneshot(get("/api/requests")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["id"], "b");
    assert_eq!(rows[0]["status"], "Approved");
    assert_eq!(rows[1]["id"], "a");
}

#[tokio::test]
async fn list_applies_status_filter() {
    let response = default_app()
        .oneshot(get("/api/requests?status=Approved"))
        .await
        .unwrap();
    let body = body_json(response).await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["fio"], "Boris Petrov");
}

#[tokio::test]
async fn list_rejects_malformed_dates() {
    let response = default_app()
        .oneshot(get("/api/requests?fromDate=05.01.2024"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn submit_rejects_student_absent_from_roster() {
    let store = MockRequestStore::new(vec![]);
    let roster = MockRosterStore::new(&[("Anna Smirnova", "MGM-101")]);
    let app = test_app(store, roster);

    let response = app
        .oneshot(post_json(
            "/api/requests",
            json!({
                "direction": "Management",
                "group": "MGM-102",
                "studentFio": "Anna Smirnova",
                "reason": "Illness",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn submit_creates_a_request_for_known_students() {
    let response = default_app()
        .oneshot(post_json(
            "/api/requests",
            json!({
                "direction": "Management",
                "group": "MGM-101",
                "studentFio": "Anna Smirnova",
                "reason": "Illness",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], "req-1");
}

#[tokio::test]
async fn submit_rejects_missing_fields() {
    let response = default_app()
        .oneshot(post_json(
            "/api/requests",
            json!({
                "direction": "Management",
                "group": "MGM-101",
                "studentFio": "",
                "reason": "Illness",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_update_requires_a_canonical_value() {
    let response = default_app()
        .oneshot(post_json(
            "/api/requests/status",
            json!({"id": "a", "status": "Escalated"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_update_succeeds_for_canonical_values() {
    let response = default_app()
        .oneshot(post_json(
            "/api/requests/status",
            json!({"id": "a", "status": "Approved"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn roster_catalog_includes_derived_directions() {
    let response = default_app().oneshot(get("/api/students")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["students"].as_array().unwrap().len(), 2);
    assert_eq!(body["directions"][0]["value"], "Management");
    assert_eq!(body["groups"][0]["direction"], "Management");
}

#[tokio::test]
async fn stats_returns_summary_with_all_status_keys() {
    let response = default_app()
        .oneshot(get("/api/students/Anna%20Smirnova/stats"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let counts = &body["summary"]["statusCounts"];
    assert_eq!(counts["Approved"], 0);
    assert_eq!(counts["Rejected"], 0);
    assert_eq!(counts["Pending"], 1);
    assert_eq!(body["summary"]["totalRequests"], 1);
    assert_eq!(body["requests"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn stats_for_unknown_student_is_not_found() {
    let response = default_app()
        .oneshot(get("/api/students/Nobody/stats"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("Nobody"));
}
