//! Audit store database schema.

/// Name of the append-only audit table.
pub const AUDIT_EVENTS_TABLE: &str = "audit_events";

/// SQL to create the audit table and its time-ordered lookup indexes.
///
/// Kept identical to the workspace migration so ad hoc setups and
/// `sqlx::migrate!` produce the same schema.
pub const CREATE_AUDIT_EVENTS_TABLE: &str =
    include_str!("../../../migrations/20260115100000_create_audit_events.sql");
