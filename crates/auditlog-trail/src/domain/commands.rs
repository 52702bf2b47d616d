//! Commands for the Audit Trail context.

use auditlog_core::command::Command;
use auditlog_core::event::NewAuditEvent;
use uuid::Uuid;

/// Command to record one entity mutation in the audit log.
#[derive(Debug, Clone)]
pub struct LogChange {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The submitted change record.
    pub event: NewAuditEvent,
}

impl Command for LogChange {
    fn command_type(&self) -> &'static str {
        "audit.log_change"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
