//! Domain model of the audit trail context.

pub mod commands;
