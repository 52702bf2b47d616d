//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use auditlog_core::clock::Clock;
use auditlog_store::pg_audit_repository::PgAuditRepository;
use auditlog_test_support::SteppingClock;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, TimeZone, Utc};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use auditlog_api::build_router;
use auditlog_api::state::AppState;

/// First timestamp handed out by the test clock.
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

/// Build the full app router with a real `PgAuditRepository` and a clock
/// that advances one second per ingested event.
pub fn build_test_app(pool: PgPool) -> Router {
    let clock = SteppingClock::new(start_time(), chrono::Duration::seconds(1));
    build_test_app_with_clock(pool, Arc::new(clock))
}

/// Build the full app router with a caller-supplied clock.
pub fn build_test_app_with_clock(pool: PgPool, clock: Arc<dyn Clock>) -> Router {
    let audit_repository = Arc::new(PgAuditRepository::new(pool));
    build_router(AppState::new(clock, audit_repository))
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
