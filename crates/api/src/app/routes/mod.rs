use axum::Router;

pub mod customer_prices;
pub mod customers;
pub mod freight_rates;
pub mod media;
pub mod products;
pub mod system;
pub mod usd_rates;
pub mod variants;

/// Router for all resource endpoints. Paths mirror what the frontend already
/// calls.
pub fn router() -> Router {
    Router::new()
        .nest("/api/productlist", products::router())
        .nest("/api/customerlist", customers::router())
        .nest("/api/customer-products", customer_prices::router())
        .nest("/api/freight-rates", freight_rates::router())
        .nest("/api/usd-rate", usd_rates::router())
        .nest("/uploads", media::router())
}
