//! Fire-and-forget hand-off of audit events to a background delivery worker.
//!
//! [`AuditDispatcher::dispatch`] never waits: it pushes onto a bounded
//! channel and returns. A single worker task drains the channel and delivers
//! each event to an [`AuditSink`] under a timeout. Delivery is at-most-once:
//! a full queue, a timeout or a sink error drops the event with a warning.
//! [`DispatcherHandle::shutdown`] closes the queue, so later dispatches are
//! refused, and lets the worker deliver what was already queued.

use std::sync::Arc;
use std::time::Duration;

use auditlog_core::event::NewAuditEvent;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::DeliveryError;
use crate::sink::AuditSink;

/// Default bound on queued, undelivered events.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Default per-delivery timeout.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Counters reported by the worker when it stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    /// Events the sink accepted.
    pub delivered: u64,
    /// Events dropped after a failed or timed-out delivery.
    pub failed: u64,
}

/// Cloneable producer side of the audit queue. Injected into every
/// interceptor that should report to the same sink.
#[derive(Debug, Clone)]
pub struct AuditDispatcher {
    sender: mpsc::Sender<NewAuditEvent>,
}

impl AuditDispatcher {
    /// Creates a dispatcher whose queue is returned to the caller instead of
    /// being drained by a worker, so queued events can be inspected directly.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<NewAuditEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Creates a dispatcher and spawns its delivery worker on the current
    /// tokio runtime.
    #[must_use]
    pub fn spawn(
        sink: Arc<dyn AuditSink>,
        capacity: usize,
        timeout: Duration,
    ) -> (Self, DispatcherHandle) {
        let (dispatcher, receiver) = Self::channel(capacity);
        let (close, closed) = oneshot::channel();
        let worker = tokio::spawn(run_worker(receiver, closed, sink, timeout));
        (dispatcher, DispatcherHandle { close, worker })
    }

    /// Enqueues `event` for delivery without waiting. Returns `false` if the
    /// event was dropped because the queue is full or the worker is gone.
    pub fn dispatch(&self, event: NewAuditEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!(
                    entity_type = %event.entity_type,
                    entity_id = %event.entity_id,
                    action = %event.action,
                    "audit queue full, dropping event"
                );
                false
            }
            Err(TrySendError::Closed(event)) => {
                warn!(
                    entity_type = %event.entity_type,
                    entity_id = %event.entity_id,
                    "audit dispatcher closed, dropping event"
                );
                false
            }
        }
    }
}

/// Owner handle of the delivery worker, held by the process entry point.
#[derive(Debug)]
pub struct DispatcherHandle {
    close: oneshot::Sender<()>,
    worker: JoinHandle<DeliveryStats>,
}

impl DispatcherHandle {
    /// Closes the queue and waits for the worker to deliver the events
    /// already in it. Dispatches made after this call return `false`. If the
    /// worker has not finished within `grace` it is aborted and undelivered
    /// events are lost.
    pub async fn shutdown(self, grace: Duration) -> DeliveryStats {
        let Self { close, mut worker } = self;
        if close.send(()).is_err() {
            debug!("audit dispatcher worker already stopped");
        }
        match tokio::time::timeout(grace, &mut worker).await {
            Ok(Ok(stats)) => stats,
            Ok(Err(err)) => {
                warn!(error = %err, "audit dispatcher worker terminated abnormally");
                DeliveryStats::default()
            }
            Err(_) => {
                warn!(?grace, "audit dispatcher did not drain in time, aborting");
                worker.abort();
                DeliveryStats::default()
            }
        }
    }
}

async fn deliver_with_timeout(
    sink: &dyn AuditSink,
    event: &NewAuditEvent,
    timeout: Duration,
) -> Result<(), DeliveryError> {
    tokio::time::timeout(timeout, sink.deliver(event))
        .await
        .map_err(|_| DeliveryError::TimedOut(timeout))?
}

async fn deliver_and_count(
    sink: &dyn AuditSink,
    event: &NewAuditEvent,
    timeout: Duration,
    stats: &mut DeliveryStats,
) {
    match deliver_with_timeout(sink, event, timeout).await {
        Ok(()) => {
            stats.delivered += 1;
            debug!(
                entity_type = %event.entity_type,
                entity_id = %event.entity_id,
                "audit event delivered"
            );
        }
        Err(err) => {
            stats.failed += 1;
            warn!(
                error = %err,
                entity_type = %event.entity_type,
                entity_id = %event.entity_id,
                action = %event.action,
                "audit delivery failed, event dropped"
            );
        }
    }
}

/// Delivers events until every sender is dropped or a close is requested.
/// On close the channel stops accepting events and the backlog is drained.
async fn run_worker(
    mut receiver: mpsc::Receiver<NewAuditEvent>,
    closed: oneshot::Receiver<()>,
    sink: Arc<dyn AuditSink>,
    timeout: Duration,
) -> DeliveryStats {
    let mut stats = DeliveryStats::default();
    let close_requested = async move {
        // Handle dropped without shutdown: run until every sender is gone.
        if closed.await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    tokio::pin!(close_requested);

    loop {
        tokio::select! {
            event = receiver.recv() => match event {
                Some(event) => deliver_and_count(sink.as_ref(), &event, timeout, &mut stats).await,
                None => break,
            },
            () = &mut close_requested => {
                receiver.close();
                while let Some(event) = receiver.recv().await {
                    deliver_and_count(sink.as_ref(), &event, timeout, &mut stats).await;
                }
                break;
            }
        }
    }
    info!(
        delivered = stats.delivered,
        failed = stats.failed,
        "audit dispatcher drained"
    );
    stats
}
