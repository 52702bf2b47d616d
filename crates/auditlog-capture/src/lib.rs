//! Audit capture: the business-service side of the audit trail.
//!
//! A business service wraps its mutating routes with the
//! [`interceptor::audit_mutations`] middleware. The middleware diffs each
//! successful create/update/delete and hands the resulting event to an
//! [`dispatcher::AuditDispatcher`], whose worker delivers it to an
//! [`sink::AuditSink`] (normally the Audit Store over HTTP) without the
//! business request ever waiting on, or failing because of, that delivery.

pub mod config;
pub mod diff;
pub mod dispatcher;
pub mod error;
pub mod interceptor;
pub mod sink;
