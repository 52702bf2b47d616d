//! Lead-management service.
//!
//! A small in-memory lead CRUD service whose mutating routes are wrapped by
//! the audit change interceptor. Every successful create, update or delete
//! produces one audit event for entity type `lead`.

pub mod auth;
pub mod config;
pub mod error;
pub mod lead;
pub mod routes;
pub mod state;

use auditlog_capture::interceptor::AuditInterceptor;
use axum::Router;
use axum::middleware::from_fn;

use crate::state::LeadsState;

/// Entity type recorded on every lead audit event.
pub const LEAD_ENTITY_TYPE: &str = "lead";

/// Builds the application router. `interceptor` audits the lead routes.
pub fn build_router(leads_state: LeadsState, interceptor: AuditInterceptor) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest(
            "/api/v1/leads",
            routes::leads::router(leads_state.clone(), interceptor),
        )
        .layer(from_fn(auth::actor_from_headers))
        .with_state(leads_state)
}
