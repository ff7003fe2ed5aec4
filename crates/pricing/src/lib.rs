//! Pricing domain module (per-customer price lists).
//!
//! This crate contains business rules for customer price rows, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod price;

pub use price::{CustomerPrice, CustomerPriceDraft, PriceId};
