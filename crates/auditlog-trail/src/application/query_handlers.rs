//! Query handlers for the Audit Trail context.
//!
//! Every query returns events newest first. An inverted time window is
//! answered with an empty result without touching the repository.

use auditlog_core::error::DomainError;
use auditlog_core::event::StoredAuditEvent;
use auditlog_core::filter::{AuditFilter, MAX_PAGE_SIZE};
use auditlog_core::repository::AuditRepository;
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

/// Lists events matching `filter`, newest first.
///
/// A supplied `limit` is clamped to [`MAX_PAGE_SIZE`]; an absent one leaves
/// the result unbounded.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a negative `limit` or `offset`.
/// Returns `DomainError::Infrastructure` if the repository is unavailable.
pub async fn list_events(
    mut filter: AuditFilter,
    repo: &dyn AuditRepository,
) -> Result<Vec<StoredAuditEvent>, DomainError> {
    if filter.limit.is_some_and(|l| l < 0) {
        return Err(DomainError::Validation("limit must not be negative".into()));
    }
    if filter.offset.is_some_and(|o| o < 0) {
        return Err(DomainError::Validation("offset must not be negative".into()));
    }
    if filter.is_empty_window() {
        debug!("inverted time window, returning no events");
        return Ok(Vec::new());
    }
    filter.limit = filter.limit.map(|l| l.min(MAX_PAGE_SIZE));

    repo.query(&filter).await
}

/// Retrieves a single event by its identifier.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if no event has the identifier.
/// Returns `DomainError::Infrastructure` if the repository is unavailable.
pub async fn get_event_by_id(
    id: Uuid,
    repo: &dyn AuditRepository,
) -> Result<StoredAuditEvent, DomainError> {
    repo.find_by_id(id)
        .await?
        .ok_or(DomainError::NotFound(id))
}

/// Returns the complete change history of one business object, newest first.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the repository is unavailable.
pub async fn get_entity_history(
    entity_id: &str,
    entity_type: &str,
    repo: &dyn AuditRepository,
) -> Result<Vec<StoredAuditEvent>, DomainError> {
    list_events(AuditFilter::for_entity(entity_id, entity_type), repo).await
}

/// Returns everything one actor did within an optional window, newest first.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the repository is unavailable.
pub async fn get_user_activity(
    user_id: &str,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    repo: &dyn AuditRepository,
) -> Result<Vec<StoredAuditEvent>, DomainError> {
    list_events(AuditFilter::for_user(user_id, start_date, end_date), repo).await
}

#[cfg(test)]
mod tests {
    use auditlog_core::error::DomainError;
    use auditlog_core::event::{AuditAction, StoredAuditEvent};
    use auditlog_core::filter::AuditFilter;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use uuid::Uuid;

    use crate::application::query_handlers::{
        get_entity_history, get_event_by_id, get_user_activity, list_events,
    };
    use auditlog_test_support::{
        FailingAuditRepository, InMemoryAuditRepository, stored_event_at,
    };

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    fn ids(events: &[StoredAuditEvent]) -> Vec<Uuid> {
        events.iter().map(|e| e.id).collect()
    }

    #[tokio::test]
    async fn test_list_events_empty_filter_returns_whole_log_newest_first() {
        // Arrange
        let a = stored_event_at("L1", "U1", t0());
        let b = stored_event_at("L2", "U2", t0() + Duration::minutes(2));
        let c = stored_event_at("L3", "U1", t0() + Duration::minutes(1));
        let repo = InMemoryAuditRepository::with_events(vec![a.clone(), b.clone(), c.clone()]);

        // Act
        let events = list_events(AuditFilter::default(), &repo).await.unwrap();

        // Assert
        assert_eq!(ids(&events), vec![b.id, c.id, a.id]);
    }

    #[tokio::test]
    async fn test_list_events_inverted_window_returns_empty() {
        // Arrange
        let repo = InMemoryAuditRepository::with_events(vec![stored_event_at("L1", "U1", t0())]);
        let filter = AuditFilter {
            start_date: Some(t0() + Duration::hours(1)),
            end_date: Some(t0() - Duration::hours(1)),
            ..AuditFilter::default()
        };

        // Act
        let events = list_events(filter, &repo).await.unwrap();

        // Assert
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_list_events_inverted_window_skips_repository() {
        let filter = AuditFilter {
            start_date: Some(t0()),
            end_date: Some(t0() - Duration::seconds(1)),
            ..AuditFilter::default()
        };

        let events = list_events(filter, &FailingAuditRepository).await.unwrap();

        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_list_events_rejects_negative_pagination() {
        let repo = InMemoryAuditRepository::new();

        for filter in [
            AuditFilter {
                limit: Some(-1),
                ..AuditFilter::default()
            },
            AuditFilter {
                offset: Some(-5),
                ..AuditFilter::default()
            },
        ] {
            let result = list_events(filter, &repo).await;
            assert!(matches!(result, Err(DomainError::Validation(_))));
        }
    }

    #[tokio::test]
    async fn test_list_events_clamps_oversized_limit() {
        // Arrange
        let events: Vec<StoredAuditEvent> = (0..1005)
            .map(|i| stored_event_at("L1", "U1", t0() + Duration::seconds(i)))
            .collect();
        let repo = InMemoryAuditRepository::with_events(events);
        let filter = AuditFilter {
            limit: Some(5000),
            ..AuditFilter::default()
        };

        // Act
        let page = list_events(filter, &repo).await.unwrap();

        // Assert
        assert_eq!(page.len(), 1000);
    }

    #[tokio::test]
    async fn test_list_events_filters_by_action() {
        let created = StoredAuditEvent {
            action: AuditAction::Create,
            ..stored_event_at("L1", "U1", t0())
        };
        let updated = stored_event_at("L1", "U1", t0() + Duration::minutes(1));
        let repo = InMemoryAuditRepository::with_events(vec![created.clone(), updated]);
        let filter = AuditFilter {
            action: Some(AuditAction::Create),
            ..AuditFilter::default()
        };

        let events = list_events(filter, &repo).await.unwrap();

        assert_eq!(ids(&events), vec![created.id]);
    }

    #[tokio::test]
    async fn test_get_event_by_id_returns_not_found() {
        // Arrange
        let repo = InMemoryAuditRepository::new();
        let id = Uuid::new_v4();

        // Act
        let result = get_event_by_id(id, &repo).await;

        // Assert
        match result {
            Err(DomainError::NotFound(missing)) => assert_eq!(missing, id),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_entity_history_matches_both_id_and_type() {
        // Arrange
        let older = stored_event_at("L1", "U1", t0());
        let newer = stored_event_at("L1", "U2", t0() + Duration::minutes(3));
        let other_entity = stored_event_at("L2", "U1", t0() + Duration::minutes(1));
        let other_type = StoredAuditEvent {
            entity_type: "contact".to_owned(),
            ..stored_event_at("L1", "U1", t0() + Duration::minutes(2))
        };
        let repo = InMemoryAuditRepository::with_events(vec![
            older.clone(),
            other_entity,
            other_type,
            newer.clone(),
        ]);

        // Act
        let history = get_entity_history("L1", "lead", &repo).await.unwrap();

        // Assert
        assert_eq!(ids(&history), vec![newer.id, older.id]);
    }

    #[tokio::test]
    async fn test_get_entity_history_keeps_concurrent_updates_separate() {
        // Arrange: two updates racing on the same lead.
        let first = stored_event_at("L1", "U1", t0() + Duration::milliseconds(1));
        let second = stored_event_at("L1", "U2", t0() + Duration::milliseconds(2));
        let repo = InMemoryAuditRepository::with_events(vec![second.clone(), first.clone()]);

        // Act
        let history = get_entity_history("L1", "lead", &repo).await.unwrap();

        // Assert
        assert_eq!(ids(&history), vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_get_user_activity_respects_window() {
        // Arrange
        let before = stored_event_at("L1", "U1", t0() - Duration::days(1));
        let inside = stored_event_at("L2", "U1", t0());
        let someone_else = stored_event_at("L3", "U2", t0());
        let repo =
            InMemoryAuditRepository::with_events(vec![before, inside.clone(), someone_else]);

        // Act
        let activity = get_user_activity(
            "U1",
            Some(t0() - Duration::hours(1)),
            Some(t0() + Duration::hours(1)),
            &repo,
        )
        .await
        .unwrap();

        // Assert
        assert_eq!(ids(&activity), vec![inside.id]);
    }

    #[tokio::test]
    async fn test_get_user_activity_surfaces_repository_failure() {
        let result = get_user_activity("U1", None, None, &FailingAuditRepository).await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}
