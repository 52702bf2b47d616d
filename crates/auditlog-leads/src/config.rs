//! Lead service configuration read from the environment.

use std::net::SocketAddr;

use auditlog_capture::config::DispatcherConfig;

use crate::error::AppError;

/// Service name recorded in audit metadata when `AUDIT_SERVICE_NAME` is unset.
pub const DEFAULT_SERVICE_NAME: &str = "leads";

/// Settings the lead service reads once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadsConfig {
    /// Interface to bind (`HOST`).
    pub host: String,
    /// Port to bind (`PORT`).
    pub port: u16,
    /// How audit events reach the audit store.
    pub dispatcher: DispatcherConfig,
}

impl LeadsConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError` if `PORT` does not parse or the dispatcher settings
    /// are missing or invalid.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`LeadsConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = lookup("PORT")
            .unwrap_or_else(|| "3100".to_string())
            .parse()
            .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?;
        let dispatcher = DispatcherConfig::from_lookup(DEFAULT_SERVICE_NAME, &lookup)?;

        Ok(Self {
            host,
            port,
            dispatcher,
        })
    }

    /// The address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST` is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}
