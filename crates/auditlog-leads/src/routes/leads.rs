//! Lead CRUD routes, audited by the change interceptor.

use auditlog_capture::interceptor::{AuditInterceptor, BeforeImage, audit_mutations};
use axum::extract::{FromRequestParts, Path, RawPathParams, Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::Response;
use axum::{Json, Router, routing::get};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::LeadError;
use crate::lead::{Lead, LeadInput, LeadPatch};
use crate::state::LeadsState;

/// Success envelope for lead responses.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    /// Always `true`.
    pub success: bool,
    /// The payload.
    pub data: T,
}

impl<T> DataResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// Middleware that attaches the stored lead as the [`BeforeImage`] of an
/// update or delete, so the interceptor can diff against it.
pub async fn load_before_image(
    State(state): State<LeadsState>,
    request: Request,
    next: Next,
) -> Response {
    if !matches!(
        *request.method(),
        Method::PUT | Method::PATCH | Method::DELETE
    ) {
        return next.run(request).await;
    }

    let (mut parts, body) = request.into_parts();
    let id = RawPathParams::from_request_parts(&mut parts, &state)
        .await
        .ok()
        .and_then(|params| {
            params
                .iter()
                .find(|(name, _)| *name == "id")
                .map(|(_, value)| value.to_owned())
        });
    if let Some(id) = id
        && let Some(lead) = state.leads.get(&id).await
    {
        match serde_json::to_value(&lead) {
            Ok(snapshot) => {
                parts.extensions.insert(BeforeImage(snapshot));
            }
            Err(err) => warn!(error = %err, lead_id = %id, "could not snapshot lead"),
        }
    }
    next.run(Request::from_parts(parts, body)).await
}

/// POST /
#[instrument(skip(state, input))]
async fn create_lead(
    State(state): State<LeadsState>,
    Json(input): Json<LeadInput>,
) -> Result<(StatusCode, Json<DataResponse<Lead>>), LeadError> {
    let lead = state.leads.create(input).await?;
    info!(lead_id = %lead.id, "lead created");
    Ok((StatusCode::CREATED, DataResponse::ok(lead)))
}

/// GET /
async fn list_leads(State(state): State<LeadsState>) -> Json<DataResponse<Vec<Lead>>> {
    DataResponse::ok(state.leads.list().await)
}

/// GET /{id}
#[instrument(skip(state))]
async fn get_lead(
    State(state): State<LeadsState>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Lead>>, LeadError> {
    let lead = state.leads.get(&id).await.ok_or(LeadError::NotFound(id))?;
    Ok(DataResponse::ok(lead))
}

/// PUT /{id}
#[instrument(skip(state, input))]
async fn replace_lead(
    State(state): State<LeadsState>,
    Path(id): Path<String>,
    Json(input): Json<LeadInput>,
) -> Result<Json<DataResponse<Lead>>, LeadError> {
    let lead = state.leads.replace(&id, input).await?;
    info!("lead replaced");
    Ok(DataResponse::ok(lead))
}

/// PATCH /{id}
#[instrument(skip(state, patch))]
async fn update_lead(
    State(state): State<LeadsState>,
    Path(id): Path<String>,
    Json(patch): Json<LeadPatch>,
) -> Result<Json<DataResponse<Lead>>, LeadError> {
    let lead = state.leads.update(&id, patch).await?;
    info!("lead updated");
    Ok(DataResponse::ok(lead))
}

/// DELETE /{id}
#[instrument(skip(state))]
async fn delete_lead(
    State(state): State<LeadsState>,
    Path(id): Path<String>,
) -> Result<StatusCode, LeadError> {
    state.leads.remove(&id).await?;
    info!("lead deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Returns the lead router. Mutations are audited by `interceptor`; the
/// before-image loader runs first so updates and deletes carry a snapshot.
pub fn router(leads_state: LeadsState, interceptor: AuditInterceptor) -> Router<LeadsState> {
    Router::new()
        .route("/", get(list_leads).post(create_lead))
        .route(
            "/{id}",
            get(get_lead)
                .put(replace_lead)
                .patch(update_lead)
                .delete(delete_lead),
        )
        .layer(from_fn_with_state(interceptor, audit_mutations))
        .layer(from_fn_with_state(leads_state, load_before_image))
}
