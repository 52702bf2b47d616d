//! Query filter over the audit log.

use chrono::{DateTime, Utc};

use crate::event::{AuditAction, StoredAuditEvent};

/// Upper bound applied to any caller-supplied page size.
pub const MAX_PAGE_SIZE: i64 = 1000;

/// AND-combined filter over stored audit events. Every criterion is optional;
/// the default filter matches the entire log.
///
/// Results are always ordered newest first, with insertion order breaking
/// timestamp ties. That ordering is part of the repository contract, not a
/// filter option.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    /// Only events for this entity identifier.
    pub entity_id: Option<String>,
    /// Only events for this entity type.
    pub entity_type: Option<String>,
    /// Only events by this actor.
    pub user_id: Option<String>,
    /// Only events of this action.
    pub action: Option<AuditAction>,
    /// Inclusive lower time bound.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper time bound.
    pub end_date: Option<DateTime<Utc>>,
    /// Maximum number of events to return; `None` means unbounded.
    pub limit: Option<i64>,
    /// Number of matching events to skip.
    pub offset: Option<i64>,
}

impl AuditFilter {
    /// Filter for the full history of one business entity.
    #[must_use]
    pub fn for_entity(entity_id: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            entity_id: Some(entity_id.into()),
            entity_type: Some(entity_type.into()),
            ..Self::default()
        }
    }

    /// Filter for one actor's activity within an optional window.
    #[must_use]
    pub fn for_user(
        user_id: impl Into<String>,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            user_id: Some(user_id.into()),
            start_date,
            end_date,
            ..Self::default()
        }
    }

    /// Returns `true` when the time window is inverted and can match nothing.
    #[must_use]
    pub fn is_empty_window(&self) -> bool {
        matches!((self.start_date, self.end_date), (Some(start), Some(end)) if start > end)
    }

    /// Returns `true` if `event` satisfies every criterion. Pagination is not
    /// considered.
    #[must_use]
    pub fn matches(&self, event: &StoredAuditEvent) -> bool {
        self.entity_id.as_ref().is_none_or(|id| *id == event.entity_id)
            && self
                .entity_type
                .as_ref()
                .is_none_or(|t| *t == event.entity_type)
            && self.user_id.as_ref().is_none_or(|u| *u == event.user_id)
            && self.action.is_none_or(|a| a == event.action)
            && self.start_date.is_none_or(|start| event.timestamp >= start)
            && self.end_date.is_none_or(|end| event.timestamp <= end)
    }
}
