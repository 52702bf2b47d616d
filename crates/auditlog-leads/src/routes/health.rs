//! Liveness endpoint for the lead service.

use axum::extract::State;
use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::state::LeadsState;

/// Body of `GET /health`.
#[derive(Serialize)]
pub struct LeadsHealth {
    /// Always `ok` while the process serves requests.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Number of leads currently held.
    pub leads: usize,
}

async fn health(State(state): State<LeadsState>) -> Json<LeadsHealth> {
    Json(LeadsHealth {
        status: "ok",
        service: "leads",
        version: env!("CARGO_PKG_VERSION"),
        leads: state.leads.count().await,
    })
}

/// Returns the `/health` router.
pub fn router() -> Router<LeadsState> {
    Router::new().route("/health", get(health))
}
