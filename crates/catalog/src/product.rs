use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use exportdesk_core::{DomainError, DomainResult};

use crate::variant::{Variant, validate_entries};

/// Product identifier (store-assigned row id).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(i64);

exportdesk_core::impl_row_id!(ProductId, "ProductId");

/// A catalog product with its nested variant sequence.
///
/// The variant sequence is part of the product document itself, not a
/// separate resource: a product fetch always carries all of its variants,
/// and a full-document write overwrites them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub common_name: String,
    pub scientific_name: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    /// Never null on the wire; a product without variants has `[]`.
    #[serde(default)]
    pub variants: Vec<Variant>,
    pub created_at: DateTime<Utc>,
}

/// Field values for a product about to be created or overwritten.
///
/// Carries fully materialized variants: the boundary resolves missing variant
/// ids before validation, so the distinctness check sees the final sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductDraft {
    pub common_name: String,
    pub scientific_name: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub variants: Vec<Variant>,
}

impl ProductDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.common_name.trim().is_empty() {
            return Err(DomainError::validation("common_name cannot be empty"));
        }
        validate_entries(&self.variants)
    }
}
