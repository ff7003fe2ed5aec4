use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use exportdesk_core::{DomainError, DomainResult};

/// Freight rate identifier (store-assigned row id).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FreightRateId(i64);

exportdesk_core::impl_row_id!(FreightRateId, "FreightRateId");

/// Air freight rate card for one destination airport, per weight break.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreightRate {
    pub id: FreightRateId,
    pub country: String,
    /// Always stored uppercased.
    pub airport_code: String,
    pub airport_name: String,
    pub rate_45kg: f64,
    pub rate_100kg: f64,
    pub rate_300kg: f64,
    pub rate_500kg: f64,
    /// Effective date of the rate card (defaults to submission time).
    pub date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field values for a freight rate about to be created or overwritten.
#[derive(Debug, Clone, PartialEq)]
pub struct FreightRateDraft {
    pub country: String,
    pub airport_code: String,
    pub airport_name: String,
    pub rate_45kg: f64,
    pub rate_100kg: f64,
    pub rate_300kg: f64,
    pub rate_500kg: f64,
    pub date: Option<DateTime<Utc>>,
}

impl FreightRateDraft {
    /// Trim the text fields and uppercase the airport code. Run before
    /// [`validate`](Self::validate) so the checks see the stored form.
    pub fn normalized(self) -> Self {
        Self {
            country: self.country.trim().to_string(),
            airport_code: self.airport_code.trim().to_uppercase(),
            airport_name: self.airport_name.trim().to_string(),
            ..self
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.country.is_empty() {
            return Err(DomainError::validation("country cannot be empty"));
        }
        if self.airport_code.is_empty() {
            return Err(DomainError::validation("airport_code cannot be empty"));
        }
        if self.airport_name.is_empty() {
            return Err(DomainError::validation("airport_name cannot be empty"));
        }
        let rates = [
            ("rate_45kg", self.rate_45kg),
            ("rate_100kg", self.rate_100kg),
            ("rate_300kg", self.rate_300kg),
            ("rate_500kg", self.rate_500kg),
        ];
        for (field, value) in rates {
            if !value.is_finite() || value <= 0.0 {
                return Err(DomainError::validation(format!(
                    "{field} must be greater than 0"
                )));
            }
        }
        Ok(())
    }
}
