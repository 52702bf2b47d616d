//! Command abstractions.

use uuid::Uuid;

/// A write-side request against the audit trail.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Stable name of the command, used in logs.
    fn command_type(&self) -> &'static str;

    /// Correlation ID linking the command to the request that issued it.
    fn correlation_id(&self) -> Uuid;
}
