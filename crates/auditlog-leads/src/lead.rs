//! Lead model and its in-memory store.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::LeadError;

fn default_status() -> String {
    "new".to_owned()
}

/// A sales lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    /// Server-assigned identifier.
    pub id: String,
    /// Contact or company name.
    pub name: String,
    /// Contact e-mail address.
    pub email: Option<String>,
    /// Company the lead belongs to.
    pub company: Option<String>,
    /// Pipeline status (`new`, `contacted`, `qualified`, ...).
    pub status: String,
    /// Sales rep who owns the lead.
    pub owner: Option<String>,
}

/// Body of `POST /leads` and `PUT /leads/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LeadInput {
    /// Contact or company name; must not be blank.
    pub name: String,
    /// Contact e-mail address.
    #[serde(default)]
    pub email: Option<String>,
    /// Company the lead belongs to.
    #[serde(default)]
    pub company: Option<String>,
    /// Pipeline status, `new` when omitted.
    #[serde(default = "default_status")]
    pub status: String,
    /// Sales rep who owns the lead.
    #[serde(default)]
    pub owner: Option<String>,
}

/// Body of `PATCH /leads/{id}`. Absent fields keep their value. Unknown
/// fields are rejected so the audited payload matches what was applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LeadPatch {
    /// New name; must not be blank when present.
    pub name: Option<String>,
    /// New e-mail address.
    pub email: Option<String>,
    /// New company.
    pub company: Option<String>,
    /// New pipeline status.
    pub status: Option<String>,
    /// New owner.
    pub owner: Option<String>,
}

impl LeadInput {
    fn validate(&self) -> Result<(), LeadError> {
        if self.name.trim().is_empty() {
            return Err(LeadError::Validation("name must not be empty".into()));
        }
        Ok(())
    }

    fn into_lead(self, id: String) -> Lead {
        Lead {
            id,
            name: self.name,
            email: self.email,
            company: self.company,
            status: self.status,
            owner: self.owner,
        }
    }
}

impl Lead {
    fn apply(&mut self, patch: LeadPatch) -> Result<(), LeadError> {
        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(LeadError::Validation("name must not be empty".into()));
            }
            self.name = name;
        }
        if patch.email.is_some() {
            self.email = patch.email;
        }
        if patch.company.is_some() {
            self.company = patch.company;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if patch.owner.is_some() {
            self.owner = patch.owner;
        }
        Ok(())
    }
}

/// Process-local lead storage.
#[derive(Debug, Default)]
pub struct LeadStore {
    leads: RwLock<HashMap<String, Lead>>,
}

impl LeadStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new lead under a freshly generated identifier.
    ///
    /// # Errors
    ///
    /// Returns `LeadError::Validation` if the name is blank.
    pub async fn create(&self, input: LeadInput) -> Result<Lead, LeadError> {
        input.validate()?;
        let lead = input.into_lead(Uuid::now_v7().to_string());
        self.leads
            .write()
            .await
            .insert(lead.id.clone(), lead.clone());
        Ok(lead)
    }

    /// Inserts or overwrites a lead with a known identifier.
    pub async fn insert(&self, lead: Lead) {
        self.leads.write().await.insert(lead.id.clone(), lead);
    }

    /// The lead stored under `id`, if any.
    pub async fn get(&self, id: &str) -> Option<Lead> {
        self.leads.read().await.get(id).cloned()
    }

    /// Number of stored leads.
    pub async fn count(&self) -> usize {
        self.leads.read().await.len()
    }

    /// All leads, ordered by identifier.
    pub async fn list(&self) -> Vec<Lead> {
        let mut leads: Vec<Lead> = self.leads.read().await.values().cloned().collect();
        leads.sort_by(|a, b| a.id.cmp(&b.id));
        leads
    }

    /// Replaces every field of an existing lead.
    ///
    /// # Errors
    ///
    /// Returns `LeadError::NotFound` for an unknown id and
    /// `LeadError::Validation` for a blank name.
    pub async fn replace(&self, id: &str, input: LeadInput) -> Result<Lead, LeadError> {
        input.validate()?;
        let mut leads = self.leads.write().await;
        let slot = leads
            .get_mut(id)
            .ok_or_else(|| LeadError::NotFound(id.to_owned()))?;
        *slot = input.into_lead(id.to_owned());
        Ok(slot.clone())
    }

    /// Applies a partial update to an existing lead.
    ///
    /// # Errors
    ///
    /// Returns `LeadError::NotFound` for an unknown id and
    /// `LeadError::Validation` for a blank name.
    pub async fn update(&self, id: &str, patch: LeadPatch) -> Result<Lead, LeadError> {
        let mut leads = self.leads.write().await;
        let lead = leads
            .get_mut(id)
            .ok_or_else(|| LeadError::NotFound(id.to_owned()))?;
        lead.apply(patch)?;
        Ok(lead.clone())
    }

    /// Removes a lead and returns it.
    ///
    /// # Errors
    ///
    /// Returns `LeadError::NotFound` for an unknown id.
    pub async fn remove(&self, id: &str) -> Result<Lead, LeadError> {
        self.leads
            .write()
            .await
            .remove(id)
            .ok_or_else(|| LeadError::NotFound(id.to_owned()))
    }
}
