//! Dispatcher configuration read from the environment.

use std::sync::Arc;
use std::time::Duration;

use crate::dispatcher::{
    AuditDispatcher, DEFAULT_DELIVERY_TIMEOUT, DEFAULT_QUEUE_CAPACITY, DispatcherHandle,
};
use crate::error::{ConfigError, DeliveryError};
use crate::sink::HttpAuditSink;

/// How a business service reaches the Audit Store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Base URL of the Audit Store (`AUDIT_SERVICE_URL`).
    pub audit_service_url: String,
    /// Per-delivery timeout (`AUDIT_DISPATCH_TIMEOUT_MS`).
    pub timeout: Duration,
    /// Bound on queued events (`AUDIT_QUEUE_CAPACITY`).
    pub queue_capacity: usize,
    /// Name recorded in each event's metadata (`AUDIT_SERVICE_NAME`).
    pub service_name: String,
}

impl DispatcherConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `AUDIT_SERVICE_URL` is unset or a numeric
    /// variable does not parse.
    pub fn from_env(default_service_name: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(default_service_name, |name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    ///
    /// # Errors
    ///
    /// See [`DispatcherConfig::from_env`].
    pub fn from_lookup(
        default_service_name: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let audit_service_url = lookup("AUDIT_SERVICE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("AUDIT_SERVICE_URL"))?;

        let timeout = match lookup("AUDIT_DISPATCH_TIMEOUT_MS") {
            Some(raw) => Duration::from_millis(parse("AUDIT_DISPATCH_TIMEOUT_MS", &raw)?),
            None => DEFAULT_DELIVERY_TIMEOUT,
        };
        let queue_capacity = match lookup("AUDIT_QUEUE_CAPACITY") {
            Some(raw) => parse("AUDIT_QUEUE_CAPACITY", &raw)?,
            None => DEFAULT_QUEUE_CAPACITY,
        };
        let service_name =
            lookup("AUDIT_SERVICE_NAME").unwrap_or_else(|| default_service_name.to_owned());

        Ok(Self {
            audit_service_url,
            timeout,
            queue_capacity,
            service_name,
        })
    }

    /// Builds an HTTP sink for this configuration and spawns the dispatcher
    /// worker on the current runtime.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Http` if the HTTP client cannot be built.
    pub fn spawn_http_dispatcher(
        &self,
    ) -> Result<(AuditDispatcher, DispatcherHandle), DeliveryError> {
        let sink = HttpAuditSink::new(&self.audit_service_url, self.timeout)?;
        Ok(AuditDispatcher::spawn(
            Arc::new(sink),
            self.queue_capacity,
            self.timeout,
        ))
    }
}

fn parse<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        value: raw.to_owned(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_apply_when_only_url_is_set() {
        let config = DispatcherConfig::from_lookup(
            "leads",
            lookup_from(&[("AUDIT_SERVICE_URL", "http://audit:3000")]),
        )
        .unwrap();

        assert_eq!(config.audit_service_url, "http://audit:3000");
        assert_eq!(config.timeout, DEFAULT_DELIVERY_TIMEOUT);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.service_name, "leads");
    }

    #[test]
    fn test_overrides_are_read() {
        let config = DispatcherConfig::from_lookup(
            "leads",
            lookup_from(&[
                ("AUDIT_SERVICE_URL", "http://audit:3000"),
                ("AUDIT_DISPATCH_TIMEOUT_MS", "250"),
                ("AUDIT_QUEUE_CAPACITY", "16"),
                ("AUDIT_SERVICE_NAME", "crm-leads"),
            ]),
        )
        .unwrap();

        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.queue_capacity, 16);
        assert_eq!(config.service_name, "crm-leads");
    }

    #[test]
    fn test_missing_url_is_an_error() {
        let result = DispatcherConfig::from_lookup("leads", lookup_from(&[]));

        assert!(matches!(result, Err(ConfigError::Missing("AUDIT_SERVICE_URL"))));
    }

    #[test]
    fn test_unparsable_timeout_is_an_error() {
        let result = DispatcherConfig::from_lookup(
            "leads",
            lookup_from(&[
                ("AUDIT_SERVICE_URL", "http://audit:3000"),
                ("AUDIT_DISPATCH_TIMEOUT_MS", "soon"),
            ]),
        );

        match result {
            Err(ConfigError::Invalid { name, value, .. }) => {
                assert_eq!(name, "AUDIT_DISPATCH_TIMEOUT_MS");
                assert_eq!(value, "soon");
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }
}
