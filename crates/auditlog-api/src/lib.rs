//! Audit store HTTP API.
//!
//! Exposes ingestion and the history queries of the audit trail over JSON.
//! The binary in `main.rs` wires configuration, telemetry and the database
//! pool around [`build_router`].

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

use axum::Router;

use crate::state::AppState;

/// Builds the application router with every route mounted at its public
/// path. Middleware layers are added by the caller.
pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/audit", routes::audit::router())
        .with_state(app_state)
}
