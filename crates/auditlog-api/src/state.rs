//! Shared application state.

use std::sync::Arc;

use auditlog_core::clock::Clock;
use auditlog_core::repository::AuditRepository;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Source of server-assigned event timestamps.
    pub clock: Arc<dyn Clock>,
    /// Append-only audit event log.
    pub audit_repository: Arc<dyn AuditRepository>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, audit_repository: Arc<dyn AuditRepository>) -> Self {
        Self {
            clock,
            audit_repository,
        }
    }
}
