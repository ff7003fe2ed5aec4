//! Catalog domain module (products and their size/price variants).
//!
//! This crate contains business rules for the product catalog, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod product;
pub mod variant;

pub use product::{Product, ProductDraft, ProductId};
pub use variant::{Variant, VariantDraft, VariantId, VariantSet};
