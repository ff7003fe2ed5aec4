use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use exportdesk_core::{DomainError, DomainResult};

/// USD rate entry identifier (store-assigned row id).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsdRateId(i64);

exportdesk_core::impl_row_id!(UsdRateId, "UsdRateId");

/// One entry of the USD exchange rate history. The newest entry is "the"
/// current rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsdRate {
    pub id: UsdRateId,
    pub rate: f64,
    /// Effective date of the rate (defaults to submission time).
    pub date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field values for a USD rate entry about to be created or overwritten.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsdRateDraft {
    pub rate: f64,
    pub date: Option<DateTime<Utc>>,
}

impl UsdRateDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Err(DomainError::validation("rate must be greater than 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_a_positive_rate() {
        let draft = UsdRateDraft {
            rate: 117.25,
            date: None,
        };
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_negative_and_non_finite() {
        for rate in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let draft = UsdRateDraft { rate, date: None };
            match draft.validate().unwrap_err() {
                DomainError::Validation(_) => {}
                _ => panic!("Expected Validation error for rate {rate}"),
            }
        }
    }
}
