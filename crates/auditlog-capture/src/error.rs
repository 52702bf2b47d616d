//! Capture error types.

use std::time::Duration;

use auditlog_core::error::DomainError;
use thiserror::Error;

/// Reasons a single audit delivery can fail. Always logged and swallowed by
/// the dispatcher; never surfaced to the business request.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The audit store answered with a non-success status.
    #[error("audit store rejected event ({status}): {message}")]
    Rejected {
        /// HTTP status code returned by the store.
        status: u16,
        /// Response body.
        message: String,
    },

    /// The delivery did not complete within the configured timeout.
    #[error("delivery timed out after {0:?}")]
    TimedOut(Duration),

    /// The in-process store refused or failed to persist the event.
    #[error("store error: {0}")]
    Store(#[from] DomainError),
}

/// Invalid or missing dispatcher configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("{0} environment variable must be set")]
    Missing(&'static str),

    /// A variable is set but cannot be used.
    #[error("{name} is invalid ({value}): {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
        /// Parse failure.
        reason: String,
    },
}
