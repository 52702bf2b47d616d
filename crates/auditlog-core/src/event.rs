//! Audit event types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::DomainError;

/// Field name of the single change entry recorded for a deletion.
pub const DELETE_SENTINEL_FIELD: &str = "*";

/// The kind of mutation an audit event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    /// A new entity was created.
    Create,
    /// An existing entity was modified.
    Update,
    /// An entity was removed.
    Delete,
}

impl AuditAction {
    /// Returns the wire/storage name of the action.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            other => Err(DomainError::Validation(format!(
                "unknown audit action: {other}"
            ))),
        }
    }
}

/// One field-level difference between the before and after state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    /// The changed field, or `"*"` for a whole-entity deletion.
    pub field: String,
    /// Value before the mutation (`null` for creations).
    #[serde(default)]
    pub old_value: Value,
    /// Value after the mutation (`null` for deletions).
    #[serde(default)]
    pub new_value: Value,
}

impl FieldChange {
    /// Creates a change entry.
    #[must_use]
    pub fn new(field: impl Into<String>, old_value: Value, new_value: Value) -> Self {
        Self {
            field: field.into(),
            old_value,
            new_value,
        }
    }
}

/// An audit event as submitted for ingestion, before the store assigns its
/// identity and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAuditEvent {
    /// Identifier of the business entity that changed.
    pub entity_id: String,
    /// Category tag of the entity (e.g. `lead`, `contact`).
    pub entity_type: String,
    /// The mutation kind.
    pub action: AuditAction,
    /// Ordered field-level changes.
    pub changes: Vec<FieldChange>,
    /// Identity of the acting user.
    pub user_id: String,
    /// Role of the acting user.
    pub user_type: String,
    /// Originating client address, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Originating client user agent, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Forensic context (service name, HTTP path, method).
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl NewAuditEvent {
    /// Promotes the submission to a stored record with server-assigned
    /// identity and timestamp.
    #[must_use]
    pub fn into_stored(self, id: Uuid, timestamp: DateTime<Utc>) -> StoredAuditEvent {
        StoredAuditEvent {
            id,
            entity_id: self.entity_id,
            entity_type: self.entity_type,
            action: self.action,
            changes: self.changes,
            user_id: self.user_id,
            user_type: self.user_type,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            metadata: self.metadata,
            timestamp,
        }
    }
}

/// A persisted, immutable audit event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAuditEvent {
    /// Unique event identifier, assigned at persistence time.
    pub id: Uuid,
    /// Identifier of the business entity that changed.
    pub entity_id: String,
    /// Category tag of the entity.
    pub entity_type: String,
    /// The mutation kind.
    pub action: AuditAction,
    /// Ordered field-level changes.
    pub changes: Vec<FieldChange>,
    /// Identity of the acting user.
    pub user_id: String,
    /// Role of the acting user.
    pub user_type: String,
    /// Originating client address, if known.
    pub ip_address: Option<String>,
    /// Originating client user agent, if known.
    pub user_agent: Option<String>,
    /// Forensic context.
    pub metadata: Map<String, Value>,
    /// Server-assigned creation time.
    pub timestamp: DateTime<Utc>,
}

impl StoredAuditEvent {
    /// Returns the submission this record was created from, i.e. the record
    /// without its server-assigned fields.
    #[must_use]
    pub fn submission(&self) -> NewAuditEvent {
        NewAuditEvent {
            entity_id: self.entity_id.clone(),
            entity_type: self.entity_type.clone(),
            action: self.action,
            changes: self.changes.clone(),
            user_id: self.user_id.clone(),
            user_type: self.user_type.clone(),
            ip_address: self.ip_address.clone(),
            user_agent: self.user_agent.clone(),
            metadata: self.metadata.clone(),
        }
    }
}
