//! Test repositories: mock `AuditRepository` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use auditlog_core::error::DomainError;
use auditlog_core::event::StoredAuditEvent;
use auditlog_core::filter::AuditFilter;
use auditlog_core::repository::AuditRepository;
use uuid::Uuid;

/// An in-memory audit repository that honours the full repository contract:
/// filtering, newest-first ordering with insertion-order tiebreaks, and
/// `limit`/`offset` pagination.
#[derive(Debug, Default)]
pub struct InMemoryAuditRepository {
    events: Mutex<Vec<StoredAuditEvent>>,
}

impl InMemoryAuditRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-populated with `events`, in insertion order.
    #[must_use]
    pub fn with_events(events: Vec<StoredAuditEvent>) -> Self {
        Self {
            events: Mutex::new(events),
        }
    }

    /// Returns a snapshot of all inserted events, in insertion order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn events(&self) -> Vec<StoredAuditEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditRepository for InMemoryAuditRepository {
    async fn insert(&self, event: &StoredAuditEvent) -> Result<(), DomainError> {
        let mut events = self.events.lock().unwrap();
        if events.iter().any(|e| e.id == event.id) {
            return Err(DomainError::Infrastructure(format!(
                "duplicate audit event id {}",
                event.id
            )));
        }
        events.push(event.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<StoredAuditEvent>, DomainError> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }

    async fn query(&self, filter: &AuditFilter) -> Result<Vec<StoredAuditEvent>, DomainError> {
        // Newest insertion first, then a stable sort keeps that order for ties.
        let mut matching: Vec<StoredAuditEvent> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let offset = usize::try_from(filter.offset.unwrap_or(0)).unwrap_or(0);
        let limit = filter
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(0));
        Ok(matching.into_iter().skip(offset).take(limit).collect())
    }
}

/// An audit repository that always returns an infrastructure error. Useful
/// for testing error-handling paths.
#[derive(Debug)]
pub struct FailingAuditRepository;

#[async_trait]
impl AuditRepository for FailingAuditRepository {
    async fn insert(&self, _event: &StoredAuditEvent) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn find_by_id(&self, _id: Uuid) -> Result<Option<StoredAuditEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn query(&self, _filter: &AuditFilter) -> Result<Vec<StoredAuditEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
