//! Field-level diff between an entity's before-image and a mutation payload.

use auditlog_core::event::{AuditAction, DELETE_SENTINEL_FIELD, FieldChange};
use serde_json::{Map, Value};

/// Tunes how update diffs are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffPolicy {
    /// Drop update entries whose old and new values are equal. Off by
    /// default: every submitted field is recorded.
    pub suppress_unchanged: bool,
}

/// One entry per payload field, each with a `null` old value.
#[must_use]
pub fn diff_create(payload: &Map<String, Value>) -> Vec<FieldChange> {
    payload
        .iter()
        .map(|(field, value)| FieldChange::new(field.as_str(), Value::Null, value.clone()))
        .collect()
}

/// One entry per payload field, pairing it with the same field of `before`.
/// Fields absent from `before` (or a missing before-image) read as `null`.
#[must_use]
pub fn diff_update(
    before: Option<&Value>,
    payload: &Map<String, Value>,
    policy: DiffPolicy,
) -> Vec<FieldChange> {
    payload
        .iter()
        .filter_map(|(field, new_value)| {
            let old_value = before
                .and_then(|b| b.get(field))
                .cloned()
                .unwrap_or(Value::Null);
            if policy.suppress_unchanged && old_value == *new_value {
                return None;
            }
            Some(FieldChange::new(field.as_str(), old_value, new_value.clone()))
        })
        .collect()
}

/// The single whole-entity entry recorded for a deletion.
#[must_use]
pub fn diff_delete(before: Option<&Value>) -> Vec<FieldChange> {
    vec![FieldChange::new(
        DELETE_SENTINEL_FIELD,
        before.cloned().unwrap_or(Value::Null),
        Value::Null,
    )]
}

/// Computes the change list for `action`. Creations and updates without an
/// object payload produce no changes, which means no event.
#[must_use]
pub fn compute_changes(
    action: AuditAction,
    payload: Option<&Map<String, Value>>,
    before: Option<&Value>,
    policy: DiffPolicy,
) -> Vec<FieldChange> {
    match (action, payload) {
        (AuditAction::Create, Some(payload)) => diff_create(payload),
        (AuditAction::Update, Some(payload)) => diff_update(before, payload, policy),
        (AuditAction::Create | AuditAction::Update, None) => Vec::new(),
        (AuditAction::Delete, _) => diff_delete(before),
    }
}
