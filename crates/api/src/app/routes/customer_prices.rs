use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use exportdesk_customers::CustomerId;
use exportdesk_pricing::PriceId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_price))
        // One path position, two readings: GET takes the segment as a
        // customer id, PUT/DELETE as a price row id.
        .route("/:id", get(list_prices).put(update_price).delete(delete_price))
}

/// A customer's price list, ordered by product name. An unknown customer
/// simply has an empty list.
pub async fn list_prices(
    Extension(services): Extension<Arc<AppServices>>,
    Path(customer_id): Path<String>,
) -> axum::response::Response {
    let customer_id: CustomerId = match customer_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid customer id"),
    };
    match services.prices.list_for_customer(customer_id).await {
        Ok(prices) => Json(prices).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_price(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CustomerPriceRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::require_json(body) {
        Ok(body) => body,
        Err(resp) => return resp,
    };

    let draft = body.into_draft();
    if let Err(e) = draft.validate() {
        return errors::domain_error_to_response(e);
    }

    match services.prices.insert(draft).await {
        Ok(price) => (StatusCode::CREATED, Json(price)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_price(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::CustomerPriceRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: PriceId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid price id"),
    };
    let body = match errors::require_json(body) {
        Ok(body) => body,
        Err(resp) => return resp,
    };

    let draft = body.into_draft();
    if let Err(e) = draft.validate() {
        return errors::domain_error_to_response(e);
    }

    match services.prices.update(id, draft).await {
        Ok(Some(price)) => Json(price).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "Price not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_price(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: PriceId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid price id"),
    };
    match services.prices.delete(id).await {
        Ok(_) => Json(serde_json::json!({ "message": "Price deleted successfully" })).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
