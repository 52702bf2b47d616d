//! Event fixtures shared across test suites.

use auditlog_core::event::{AuditAction, FieldChange, NewAuditEvent, StoredAuditEvent};
use chrono::{DateTime, Utc};
use serde_json::{Map, json};
use uuid::Uuid;

/// The canonical lead status change: lead `L1` moved from `new` to
/// `qualified` by admin `U1`.
#[must_use]
pub fn lead_status_change() -> NewAuditEvent {
    NewAuditEvent {
        entity_id: "L1".to_owned(),
        entity_type: "lead".to_owned(),
        action: AuditAction::Update,
        changes: vec![FieldChange::new("status", json!("new"), json!("qualified"))],
        user_id: "U1".to_owned(),
        user_type: "admin".to_owned(),
        ip_address: None,
        user_agent: None,
        metadata: Map::new(),
    }
}

/// A stored event for `(entity_id, "lead")` by `user_id` at `timestamp`.
#[must_use]
pub fn stored_event_at(entity_id: &str, user_id: &str, timestamp: DateTime<Utc>) -> StoredAuditEvent {
    NewAuditEvent {
        entity_id: entity_id.to_owned(),
        user_id: user_id.to_owned(),
        ..lead_status_change()
    }
    .into_stored(Uuid::now_v7(), timestamp)
}
