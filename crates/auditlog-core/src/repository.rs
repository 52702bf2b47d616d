//! Audit repository abstraction.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DomainError;
use crate::event::StoredAuditEvent;
use crate::filter::AuditFilter;

/// Append-only repository of audit events.
///
/// There is no update or delete: a persisted event is immutable.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persist a fully formed event.
    async fn insert(&self, event: &StoredAuditEvent) -> Result<(), DomainError>;

    /// Load a single event by identifier.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<StoredAuditEvent>, DomainError>;

    /// Load the events matching `filter`, newest first, with insertion order
    /// breaking timestamp ties. `limit` and `offset` apply after ordering.
    async fn query(&self, filter: &AuditFilter) -> Result<Vec<StoredAuditEvent>, DomainError>;
}
