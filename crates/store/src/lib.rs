//! Storage layer: per-resource stores over Postgres (sqlx) or process-local
//! memory, plus object storage for uploaded media.
//!
//! Each store is an enum over its backends; callers go through the enum and
//! stay backend-agnostic. The in-memory backends mirror the Postgres
//! semantics, including the optimistic version check guarding variant
//! writes, so tests exercise the same protocol the database enforces.

pub mod customers;
pub mod error;
pub mod freight_rates;
pub mod media;
pub mod prices;
pub mod products;
pub mod usd_rates;

pub use customers::CustomerStore;
pub use error::{StoreError, StoreResult};
pub use freight_rates::FreightRateStore;
pub use media::{CUSTOMER_IMAGES_BUCKET, MediaStore, PRODUCT_IMAGES_BUCKET, StoredObject};
pub use prices::PriceStore;
pub use products::ProductStore;
pub use usd_rates::UsdRateStore;

pub use sqlx::PgPool;

/// Connect a Postgres pool for the persistent backends.
pub async fn connect(database_url: &str) -> StoreResult<PgPool> {
    PgPool::connect(database_url)
        .await
        .map_err(|e| error::map_sqlx_error("connect", e))
}
