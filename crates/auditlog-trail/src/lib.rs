//! Audit Trail: the bounded context that owns the append-only change log.
//!
//! Responsible for accepting change records (ingestion) and answering
//! history queries by entity, actor, action and time window.

pub mod application;
pub mod domain;
