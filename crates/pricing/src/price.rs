use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use exportdesk_catalog::ProductId;
use exportdesk_core::{DomainError, DomainResult};
use exportdesk_customers::CustomerId;

/// Price row identifier (store-assigned row id).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceId(i64);

exportdesk_core::impl_row_id!(PriceId, "PriceId");

/// One row of a customer's price list: a product (or free-form line) with the
/// costing chain from purchasing price up to CNF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerPrice {
    pub id: PriceId,
    pub customer_id: CustomerId,
    pub product_id: Option<ProductId>,
    pub common_name: String,
    pub category: Option<String>,
    pub size_range: Option<String>,
    pub purchasing_price: Option<f64>,
    pub exfactory_price: Option<f64>,
    pub margin: Option<f64>,
    pub margin_percentage: Option<f64>,
    pub export_doc: Option<f64>,
    pub transport_cost: Option<f64>,
    pub loading_cost: Option<f64>,
    pub airway_cost: Option<f64>,
    pub forward_handling_cost: Option<f64>,
    pub multiplier: Option<f64>,
    pub divisor: Option<f64>,
    pub freight_cost: Option<f64>,
    pub gross_weight_tier: Option<String>,
    pub fob_price: Option<f64>,
    pub cnf: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Field values for a price row about to be created or overwritten.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerPriceDraft {
    pub customer_id: CustomerId,
    pub product_id: Option<ProductId>,
    pub common_name: String,
    pub category: Option<String>,
    pub size_range: Option<String>,
    pub purchasing_price: Option<f64>,
    pub exfactory_price: Option<f64>,
    pub margin: Option<f64>,
    pub margin_percentage: Option<f64>,
    pub export_doc: Option<f64>,
    pub transport_cost: Option<f64>,
    pub loading_cost: Option<f64>,
    pub airway_cost: Option<f64>,
    pub forward_handling_cost: Option<f64>,
    pub multiplier: Option<f64>,
    pub divisor: Option<f64>,
    pub freight_cost: Option<f64>,
    pub gross_weight_tier: Option<String>,
    pub fob_price: Option<f64>,
    pub cnf: Option<f64>,
}

impl CustomerPriceDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.common_name.trim().is_empty() {
            return Err(DomainError::validation("common_name cannot be empty"));
        }
        let numeric = [
            ("purchasing_price", self.purchasing_price),
            ("exfactory_price", self.exfactory_price),
            ("margin", self.margin),
            ("margin_percentage", self.margin_percentage),
            ("export_doc", self.export_doc),
            ("transport_cost", self.transport_cost),
            ("loading_cost", self.loading_cost),
            ("airway_cost", self.airway_cost),
            ("forward_handling_cost", self.forward_handling_cost),
            ("multiplier", self.multiplier),
            ("divisor", self.divisor),
            ("freight_cost", self.freight_cost),
            ("fob_price", self.fob_price),
            ("cnf", self.cnf),
        ];
        for (field, value) in numeric {
            if let Some(value) = value {
                if !value.is_finite() {
                    return Err(DomainError::validation(format!(
                        "{field} must be a number"
                    )));
                }
            }
        }
        Ok(())
    }
}
