//! Integration tests for ingestion and history queries against `PostgreSQL`.

mod common;

use std::sync::Arc;

use auditlog_core::clock::SystemClock;
use auditlog_core::event::NewAuditEvent;
use auditlog_test_support::lead_status_change;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

fn submission(event: &NewAuditEvent) -> Value {
    serde_json::to_value(event).unwrap()
}

fn ids(json: &Value) -> Vec<String> {
    json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap().to_owned())
        .collect()
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_lead_update_is_ingested_and_heads_entity_history(pool: PgPool) {
    // Arrange
    let app = common::build_test_app_with_clock(pool, Arc::new(SystemClock));
    let requested_at = Utc::now();

    // Act: POST /api/v1/audit/events
    let (status, json) = common::post_json(
        app.clone(),
        "/api/v1/audit/events",
        &submission(&lead_status_change()),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["success"], true);
    let id = json["data"]["id"].as_str().unwrap().to_owned();
    Uuid::parse_str(&id).unwrap();
    let timestamp: DateTime<Utc> = json["data"]["timestamp"].as_str().unwrap().parse().unwrap();
    // Stored timestamps are truncated to microseconds.
    assert!(timestamp >= requested_at - chrono::Duration::microseconds(1));

    // GET /api/v1/audit/entities/lead/L1 (verify persisted history)
    let (status, json) = common::get_json(app, "/api/v1/audit/entities/lead/L1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json).first(), Some(&id));
    assert_eq!(json["data"][0]["changes"][0]["field"], "status");
    assert_eq!(json["data"][0]["changes"][0]["oldValue"], "new");
    assert_eq!(json["data"][0]["changes"][0]["newValue"], "qualified");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_ingested_event_reads_back_unchanged_by_id(pool: PgPool) {
    // Arrange
    let app = common::build_test_app(pool);
    let mut event = lead_status_change();
    event.ip_address = Some("203.0.113.9".to_owned());
    event.user_agent = Some("crm-web/1.0".to_owned());
    event.metadata.insert("service".to_owned(), json!("leads"));
    event.metadata.insert("path".to_owned(), json!("/api/v1/leads/L1"));

    // Act
    let (status, created) =
        common::post_json(app.clone(), "/api/v1/audit/events", &submission(&event)).await;
    let id = created["data"]["id"].as_str().unwrap();
    let (get_status, fetched) =
        common::get_json(app, &format!("/api/v1/audit/events/{id}")).await;

    // Assert
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(get_status, StatusCode::OK);
    assert_eq!(fetched["data"], created["data"]);
    let read_back: NewAuditEvent = serde_json::from_value(fetched["data"].clone()).unwrap();
    assert_eq!(read_back, event);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_unknown_event_id_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);

    let (status, json) =
        common::get_json(app, &format!("/api/v1/audit/events/{}", Uuid::new_v4())).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "not_found");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_invalid_submission_returns_400_and_stores_nothing(pool: PgPool) {
    // Arrange
    let app = common::build_test_app(pool);
    let mut body = submission(&lead_status_change());
    body["changes"] = json!([]);

    // Act
    let (status, json) = common::post_json(app.clone(), "/api/v1/audit/events", &body).await;

    // Assert
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_error");
    let (_, json) = common::get_json(app, "/api/v1/audit/events").await;
    assert_eq!(json["data"], json!([]));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_concurrent_updates_are_both_retained_newest_first(pool: PgPool) {
    // Arrange
    let app = common::build_test_app(pool);
    let mut first = lead_status_change();
    first.user_id = "U1".to_owned();
    let mut second = lead_status_change();
    second.user_id = "U2".to_owned();

    // Act
    let first_submission = submission(&first);
    let second_submission = submission(&second);
    let (a, b) = tokio::join!(
        common::post_json(app.clone(), "/api/v1/audit/events", &first_submission),
        common::post_json(app.clone(), "/api/v1/audit/events", &second_submission),
    );
    let (status, json) = common::get_json(app, "/api/v1/audit/entities/lead/L1").await;

    // Assert
    assert_eq!(a.0, StatusCode::CREATED);
    assert_eq!(b.0, StatusCode::CREATED);
    assert_eq!(status, StatusCode::OK);
    let history = json["data"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0]["timestamp"].as_str() >= history[1]["timestamp"].as_str());
    let mut users: Vec<&str> = history.iter().map(|e| e["userId"].as_str().unwrap()).collect();
    users.sort_unstable();
    assert_eq!(users, vec!["U1", "U2"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_list_events_filters_and_paginates(pool: PgPool) {
    // Arrange: three events one second apart, U1, U2, U1.
    let app = common::build_test_app(pool);
    let mut created = Vec::new();
    for user in ["U1", "U2", "U1"] {
        let mut event = lead_status_change();
        event.user_id = user.to_owned();
        let (_, json) =
            common::post_json(app.clone(), "/api/v1/audit/events", &submission(&event)).await;
        created.push(json["data"]["id"].as_str().unwrap().to_owned());
    }

    // Act
    let (_, by_user) = common::get_json(app.clone(), "/api/v1/audit/events?userId=U1").await;
    let (_, page) =
        common::get_json(app.clone(), "/api/v1/audit/events?limit=1&offset=1").await;
    let (_, windowed) = common::get_json(
        app,
        "/api/v1/audit/events?startDate=2026-01-15T10:00:01Z&endDate=2026-01-15T10:00:01Z",
    )
    .await;

    // Assert
    assert_eq!(ids(&by_user), vec![created[2].clone(), created[0].clone()]);
    assert_eq!(ids(&page), vec![created[1].clone()]);
    assert_eq!(ids(&windowed), vec![created[1].clone()]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_user_activity_with_inverted_window_is_empty(pool: PgPool) {
    let app = common::build_test_app(pool);
    common::post_json(
        app.clone(),
        "/api/v1/audit/events",
        &submission(&lead_status_change()),
    )
    .await;

    let (status, json) = common::get_json(
        app,
        "/api/v1/audit/users/U1?startDate=2026-01-16T00:00:00Z&endDate=2026-01-15T00:00:00Z",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"], json!([]));
}
