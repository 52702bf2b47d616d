//! Delivery targets for dispatched audit events.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auditlog_core::clock::Clock;
use auditlog_core::event::NewAuditEvent;
use auditlog_core::repository::AuditRepository;
use auditlog_trail::application::command_handlers::handle_log_change;
use auditlog_trail::domain::commands::LogChange;
use uuid::Uuid;

use crate::error::DeliveryError;

/// Path of the Audit Store ingestion endpoint, relative to its base URL.
pub const INGESTION_PATH: &str = "/api/v1/audit/events";

/// Something that can accept one audit event.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Deliver `event` once. Retrying is the caller's decision.
    async fn deliver(&self, event: &NewAuditEvent) -> Result<(), DeliveryError>;
}

/// Delivers events to a remote Audit Store's ingestion endpoint.
#[derive(Debug, Clone)]
pub struct HttpAuditSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAuditSink {
    /// Creates a sink posting to `{base_url}/api/v1/audit/events`, with a
    /// per-request client timeout.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Http` if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}{INGESTION_PATH}", base_url.trim_end_matches('/')),
        })
    }

    /// The full ingestion URL this sink posts to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AuditSink for HttpAuditSink {
    async fn deliver(&self, event: &NewAuditEvent) -> Result<(), DeliveryError> {
        let response = self.client.post(&self.endpoint).json(event).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }
}

/// Writes events straight into an audit repository through the ingestion
/// command handler, for services co-located with the store.
pub struct RepositorySink {
    clock: Arc<dyn Clock>,
    repository: Arc<dyn AuditRepository>,
}

impl RepositorySink {
    /// Creates a sink over `repository`, stamping events with `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, repository: Arc<dyn AuditRepository>) -> Self {
        Self { clock, repository }
    }
}

#[async_trait]
impl AuditSink for RepositorySink {
    async fn deliver(&self, event: &NewAuditEvent) -> Result<(), DeliveryError> {
        let command = LogChange {
            correlation_id: Uuid::new_v4(),
            event: event.clone(),
        };
        handle_log_change(&command, self.clock.as_ref(), self.repository.as_ref()).await?;
        Ok(())
    }
}
