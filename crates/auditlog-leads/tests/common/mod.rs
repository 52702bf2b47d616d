//! Shared test helpers for lead service integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use auditlog_capture::dispatcher::AuditDispatcher;
use auditlog_capture::interceptor::AuditInterceptor;
use auditlog_core::event::NewAuditEvent;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::sync::mpsc::Receiver;
use tower::ServiceExt;

use auditlog_leads::lead::{Lead, LeadStore};
use auditlog_leads::state::LeadsState;
use auditlog_leads::{LEAD_ENTITY_TYPE, build_router};

/// Lead `L1` as it exists before each test: status `new`, owned by `U1`.
pub fn seeded_lead() -> Lead {
    Lead {
        id: "L1".to_owned(),
        name: "Acme".to_owned(),
        email: None,
        company: None,
        status: "new".to_owned(),
        owner: Some("U1".to_owned()),
    }
}

/// Lead state holding only [`seeded_lead`].
pub async fn seeded_state() -> LeadsState {
    let leads = Arc::new(LeadStore::new());
    leads.insert(seeded_lead()).await;
    LeadsState::new(leads)
}

/// Build the full app with `dispatcher` behind the interceptor.
pub fn build_test_app(leads_state: LeadsState, dispatcher: AuditDispatcher) -> Router {
    let interceptor =
        AuditInterceptor::new(dispatcher, LEAD_ENTITY_TYPE).with_service_name("leads");
    build_router(leads_state, interceptor)
}

/// Build the full app over a seeded store, returning the audit queue so
/// tests can inspect exactly what was dispatched.
pub async fn app_with_queue() -> (Router, LeadsState, Receiver<NewAuditEvent>) {
    let leads_state = seeded_state().await;
    let (dispatcher, queue) = AuditDispatcher::channel(16);
    (build_test_app(leads_state.clone(), dispatcher), leads_state, queue)
}

/// Send a request as `user` (anonymous when `None`) and return the status
/// and JSON body (`Null` for an empty body).
pub async fn send(
    app: Router,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<&Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("user-agent", "crm-web/1.0")
        .header("x-forwarded-for", "198.51.100.4");
    if let Some(user) = user {
        builder = builder
            .header("x-user-id", user)
            .header("x-user-type", "admin");
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

    (status, json)
}
