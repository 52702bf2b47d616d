//! Shared application state.

use std::sync::Arc;

use crate::lead::LeadStore;

/// Application state shared across all request handlers.
#[derive(Debug, Clone, Default)]
pub struct LeadsState {
    /// Lead storage.
    pub leads: Arc<LeadStore>,
}

impl LeadsState {
    /// Create new application state.
    #[must_use]
    pub fn new(leads: Arc<LeadStore>) -> Self {
        Self { leads }
    }
}
