//! PostgreSQL persistence for the audit trail.

pub mod pg_audit_repository;
pub mod schema;
