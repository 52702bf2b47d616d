//! Shared test mocks and utilities for the audit trail crates.

mod clock;
mod fixtures;
mod repository;

pub use clock::{FixedClock, SteppingClock};
pub use fixtures::{lead_status_change, stored_event_at};
pub use repository::{FailingAuditRepository, InMemoryAuditRepository};
