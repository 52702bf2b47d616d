//! Audit Log Core: shared domain abstractions.
//!
//! This crate defines the audit record types, the query filter, and the
//! repository and clock traits that every other audit crate depends on.
//! It contains no infrastructure code.

pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod filter;
pub mod repository;
