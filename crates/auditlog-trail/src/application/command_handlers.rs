//! Command handlers for the Audit Trail context.
//!
//! Ingestion validates a submitted change record, stamps it with a
//! server-assigned identity and timestamp, and appends it to the log.

use auditlog_core::clock::{Clock, storage_precision};
use auditlog_core::command::Command;
use auditlog_core::error::DomainError;
use auditlog_core::event::{NewAuditEvent, StoredAuditEvent};
use auditlog_core::repository::AuditRepository;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::commands::LogChange;

/// Checks the structural requirements of a submission.
///
/// # Errors
///
/// Returns `DomainError::Validation` naming the first missing field.
pub fn validate_submission(event: &NewAuditEvent) -> Result<(), DomainError> {
    let required = [
        ("entityId", event.entity_id.as_str()),
        ("entityType", event.entity_type.as_str()),
        ("userId", event.user_id.as_str()),
    ];
    if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(DomainError::Validation(format!("{name} must not be empty")));
    }
    if event.changes.is_empty() {
        return Err(DomainError::Validation("changes must not be empty".into()));
    }
    if event.changes.iter().any(|c| c.field.trim().is_empty()) {
        return Err(DomainError::Validation(
            "every change must name a field".into(),
        ));
    }
    Ok(())
}

/// Handles the `LogChange` command: validates the submission, assigns `id`
/// and `timestamp`, and persists the resulting record.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a malformed submission and
/// `DomainError::Infrastructure` if the repository is unavailable.
pub async fn handle_log_change(
    command: &LogChange,
    clock: &dyn Clock,
    repo: &dyn AuditRepository,
) -> Result<StoredAuditEvent, DomainError> {
    validate_submission(&command.event)?;

    let stored = command
        .event
        .clone()
        .into_stored(Uuid::now_v7(), storage_precision(clock.now()));

    debug!(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id(),
        "persisting audit event"
    );
    repo.insert(&stored).await?;

    info!(
        event_id = %stored.id,
        entity_type = %stored.entity_type,
        entity_id = %stored.entity_id,
        action = %stored.action,
        "audit event recorded"
    );
    Ok(stored)
}
