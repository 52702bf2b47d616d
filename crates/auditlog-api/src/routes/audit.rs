//! Routes for the Audit Trail bounded context: ingestion and history queries.

use auditlog_core::error::DomainError;
use auditlog_core::event::{AuditAction, FieldChange, NewAuditEvent, StoredAuditEvent};
use auditlog_core::filter::AuditFilter;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::get};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use auditlog_trail::application::{command_handlers, query_handlers};
use auditlog_trail::domain::commands;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /events.
///
/// Every field defaults when absent so that a missing field is reported as a
/// validation error naming it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IngestRequest {
    /// Identifier of the business entity that changed.
    pub entity_id: String,
    /// Category tag of the entity.
    pub entity_type: String,
    /// The mutation kind.
    pub action: Option<AuditAction>,
    /// Ordered field-level changes.
    pub changes: Vec<FieldChange>,
    /// Identity of the acting user.
    pub user_id: String,
    /// Role of the acting user.
    pub user_type: String,
    /// Originating client address.
    pub ip_address: Option<String>,
    /// Originating client user agent.
    pub user_agent: Option<String>,
    /// Forensic context.
    pub metadata: Map<String, Value>,
}

impl TryFrom<IngestRequest> for NewAuditEvent {
    type Error = DomainError;

    fn try_from(request: IngestRequest) -> Result<Self, Self::Error> {
        let action = request.action.ok_or_else(|| {
            DomainError::Validation("action must be one of CREATE, UPDATE, DELETE".into())
        })?;
        Ok(Self {
            entity_id: request.entity_id,
            entity_type: request.entity_type,
            action,
            changes: request.changes,
            user_id: request.user_id,
            user_type: request.user_type,
            ip_address: request.ip_address,
            user_agent: request.user_agent,
            metadata: request.metadata,
        })
    }
}

/// Query string for GET /events.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsQuery {
    /// Only events for this entity identifier.
    pub entity_id: Option<String>,
    /// Only events for this entity type.
    pub entity_type: Option<String>,
    /// Only events by this actor.
    pub user_id: Option<String>,
    /// Only events of this action.
    pub action: Option<AuditAction>,
    /// Inclusive lower time bound (RFC 3339).
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper time bound (RFC 3339).
    pub end_date: Option<DateTime<Utc>>,
    /// Page size, clamped to the server maximum.
    pub limit: Option<i64>,
    /// Number of matching events to skip.
    pub offset: Option<i64>,
}

impl From<ListEventsQuery> for AuditFilter {
    fn from(query: ListEventsQuery) -> Self {
        Self {
            entity_id: query.entity_id,
            entity_type: query.entity_type,
            user_id: query.user_id,
            action: query.action,
            start_date: query.start_date,
            end_date: query.end_date,
            limit: query.limit,
            offset: query.offset,
        }
    }
}

/// Query string for GET /users/{userId}.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    /// Inclusive lower time bound (RFC 3339).
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper time bound (RFC 3339).
    pub end_date: Option<DateTime<Utc>>,
}

/// Success envelope shared by every audit endpoint.
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

/// POST /events
#[instrument(
    skip(state, request),
    fields(entity_type = %request.entity_type, entity_id = %request.entity_id)
)]
async fn ingest_event(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> Result<(StatusCode, Json<DataResponse<StoredAuditEvent>>), ApiError> {
    let command = commands::LogChange {
        correlation_id: Uuid::new_v4(),
        event: NewAuditEvent::try_from(request)?,
    };

    info!(correlation_id = %command.correlation_id, "handling log_change command");

    let stored = command_handlers::handle_log_change(
        &command,
        state.clock.as_ref(),
        &*state.audit_repository,
    )
    .await?;

    Ok((StatusCode::CREATED, DataResponse::ok(stored)))
}

/// GET /events
#[instrument(skip(state, query))]
async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<DataResponse<Vec<StoredAuditEvent>>>, ApiError> {
    let events = query_handlers::list_events(query.into(), &*state.audit_repository).await?;
    Ok(DataResponse::ok(events))
}

/// GET /events/{id}
#[instrument(skip(state))]
async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DataResponse<StoredAuditEvent>>, ApiError> {
    let event = query_handlers::get_event_by_id(id, &*state.audit_repository).await?;
    Ok(DataResponse::ok(event))
}

/// GET /entities/{entityType}/{entityId}
#[instrument(skip(state))]
async fn get_entity_history(
    State(state): State<AppState>,
    Path((entity_type, entity_id)): Path<(String, String)>,
) -> Result<Json<DataResponse<Vec<StoredAuditEvent>>>, ApiError> {
    let events =
        query_handlers::get_entity_history(&entity_id, &entity_type, &*state.audit_repository)
            .await?;
    Ok(DataResponse::ok(events))
}

/// GET /users/{userId}
#[instrument(skip(state, range))]
async fn get_user_activity(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<DataResponse<Vec<StoredAuditEvent>>>, ApiError> {
    let events = query_handlers::get_user_activity(
        &user_id,
        range.start_date,
        range.end_date,
        &*state.audit_repository,
    )
    .await?;
    Ok(DataResponse::ok(events))
}

/// Returns the router for the audit context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(ingest_event))
        .route("/events/{id}", get(get_event))
        .route("/entities/{entity_type}/{entity_id}", get(get_entity_history))
        .route("/users/{user_id}", get(get_user_activity))
}
