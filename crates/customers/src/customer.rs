use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use exportdesk_core::{DomainError, DomainResult};

/// Customer identifier (store-assigned row id).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(i64);

exportdesk_core::impl_row_id!(CustomerId, "CustomerId");

/// An export customer: who we ship to, where, through which airport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub country: Option<String>,
    pub airport: Option<String>,
    pub email: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Field values for a customer about to be created or overwritten.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerDraft {
    pub name: String,
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub country: Option<String>,
    pub airport: Option<String>,
    pub email: Option<String>,
    pub image_url: Option<String>,
}

impl CustomerDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_accepts_a_bare_name() {
        let draft = CustomerDraft {
            name: "Fishline GmbH".to_string(),
            ..CustomerDraft::default()
        };
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn draft_rejects_blank_name() {
        let draft = CustomerDraft {
            name: "  ".to_string(),
            ..CustomerDraft::default()
        };
        match draft.validate().unwrap_err() {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for blank name"),
        }
    }
}
