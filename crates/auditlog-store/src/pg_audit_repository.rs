//! `PostgreSQL` implementation of the `AuditRepository` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::{debug, error};
use uuid::Uuid;

use auditlog_core::error::DomainError;
use auditlog_core::event::{FieldChange, StoredAuditEvent};
use auditlog_core::filter::AuditFilter;
use auditlog_core::repository::AuditRepository;

const SELECT_EVENTS: &str = "SELECT id, entity_id, entity_type, action, changes, user_id, \
     user_type, ip_address, user_agent, metadata, occurred_at FROM audit_events";

/// Row shape of the `audit_events` table.
#[derive(Debug, FromRow)]
struct AuditEventRow {
    id: Uuid,
    entity_id: String,
    entity_type: String,
    action: String,
    changes: Json<Vec<FieldChange>>,
    user_id: String,
    user_type: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    metadata: Json<Map<String, Value>>,
    occurred_at: DateTime<Utc>,
}

impl TryFrom<AuditEventRow> for StoredAuditEvent {
    type Error = DomainError;

    fn try_from(row: AuditEventRow) -> Result<Self, Self::Error> {
        let action = row.action.parse().map_err(|_| {
            DomainError::Infrastructure(format!(
                "stored event {} has unknown action {}",
                row.id, row.action
            ))
        })?;
        Ok(Self {
            id: row.id,
            entity_id: row.entity_id,
            entity_type: row.entity_type,
            action,
            changes: row.changes.0,
            user_id: row.user_id,
            user_type: row.user_type,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            metadata: row.metadata.0,
            timestamp: row.occurred_at,
        })
    }
}

fn infrastructure(operation: &'static str) -> impl FnOnce(sqlx::Error) -> DomainError {
    move |err| {
        error!(operation, error = %err, "audit store query failed");
        DomainError::Infrastructure(format!("{operation} failed: {err}"))
    }
}

/// PostgreSQL-backed audit repository.
#[derive(Debug, Clone)]
pub struct PgAuditRepository {
    pool: PgPool,
}

impl PgAuditRepository {
    /// Creates a new `PgAuditRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Appends the `WHERE`, `ORDER BY` and pagination clauses for `filter`.
fn push_filter<'args>(builder: &mut QueryBuilder<'args, Postgres>, filter: &'args AuditFilter) {
    builder.push(" WHERE TRUE");
    if let Some(entity_id) = &filter.entity_id {
        builder.push(" AND entity_id = ").push_bind(entity_id.as_str());
    }
    if let Some(entity_type) = &filter.entity_type {
        builder.push(" AND entity_type = ").push_bind(entity_type.as_str());
    }
    if let Some(user_id) = &filter.user_id {
        builder.push(" AND user_id = ").push_bind(user_id.as_str());
    }
    if let Some(action) = filter.action {
        builder.push(" AND action = ").push_bind(action.as_str());
    }
    if let Some(start) = filter.start_date {
        builder.push(" AND occurred_at >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        builder.push(" AND occurred_at <= ").push_bind(end);
    }
    builder.push(" ORDER BY occurred_at DESC, seq DESC");
    if let Some(limit) = filter.limit {
        builder.push(" LIMIT ").push_bind(limit);
    }
    if let Some(offset) = filter.offset {
        builder.push(" OFFSET ").push_bind(offset);
    }
}

#[async_trait]
impl AuditRepository for PgAuditRepository {
    async fn insert(&self, event: &StoredAuditEvent) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO audit_events (id, entity_id, entity_type, action, changes, user_id, \
             user_type, ip_address, user_agent, metadata, occurred_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(event.id)
        .bind(&event.entity_id)
        .bind(&event.entity_type)
        .bind(event.action.as_str())
        .bind(Json(&event.changes))
        .bind(&event.user_id)
        .bind(&event.user_type)
        .bind(event.ip_address.as_deref())
        .bind(event.user_agent.as_deref())
        .bind(Json(&event.metadata))
        .bind(event.timestamp)
        .execute(&self.pool)
        .await
        .map_err(infrastructure("insert audit event"))?;

        debug!(event_id = %event.id, entity_id = %event.entity_id, "audit event persisted");
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<StoredAuditEvent>, DomainError> {
        let sql = format!("{SELECT_EVENTS} WHERE id = $1");
        let row: Option<AuditEventRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(infrastructure("load audit event"))?;

        row.map(StoredAuditEvent::try_from).transpose()
    }

    async fn query(&self, filter: &AuditFilter) -> Result<Vec<StoredAuditEvent>, DomainError> {
        let mut builder = QueryBuilder::<Postgres>::new(SELECT_EVENTS);
        push_filter(&mut builder, filter);

        let rows: Vec<AuditEventRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(infrastructure("query audit events"))?;

        rows.into_iter().map(StoredAuditEvent::try_from).collect()
    }
}
