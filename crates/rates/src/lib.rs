//! Rates domain module (air freight rates and the USD exchange rate).
//!
//! This crate contains business rules for rate records, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod dates;
pub mod freight;
pub mod usd;

pub use dates::{local_day_bounds, parse_day};
pub use freight::{FreightRate, FreightRateDraft, FreightRateId};
pub use usd::{UsdRate, UsdRateDraft, UsdRateId};
