//! Variant endpoints. Every mutation goes through the store's
//! read-modify-write protocol on the owning product document, so a concurrent
//! writer surfaces as a 409 instead of silently losing entries.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};

use exportdesk_catalog::{ProductId, VariantId};
use exportdesk_store::StoreError;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/:id/variants", get(list_variants).post(create_variant))
        .route(
            "/:id/variants/:variant_id",
            put(update_variant).delete(delete_variant),
        )
}

/// The variants array of one product, never null.
pub async fn list_variants(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };
    match services.products.get(id).await {
        Ok(Some(product)) => Json(product.variants).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "Product not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_variant(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::VariantRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };
    let body = match errors::require_json(body) {
        Ok(body) => body,
        Err(resp) => return resp,
    };

    let draft = body.into_draft();
    if let Err(e) = draft.validate() {
        return errors::domain_error_to_response(e);
    }

    match services.products.mutate_variants(id, |set| set.add(draft)).await {
        Ok(variant) => (StatusCode::CREATED, Json(variant)).into_response(),
        Err(StoreError::NotFound) => {
            errors::json_error(StatusCode::NOT_FOUND, "not_found", "Product not found")
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_variant(
    Extension(services): Extension<Arc<AppServices>>,
    Path((id, variant_id)): Path<(String, String)>,
    body: Result<Json<dto::VariantRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };
    let variant_id: VariantId = match variant_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid variant id"),
    };
    let body = match errors::require_json(body) {
        Ok(body) => body,
        Err(resp) => return resp,
    };

    let draft = body.into_draft();
    if let Err(e) = draft.validate() {
        return errors::domain_error_to_response(e);
    }

    match services
        .products
        .mutate_variants(id, |set| set.update(variant_id, draft))
        .await
    {
        Ok(Some(variant)) => Json(variant).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "Variant not found"),
        Err(StoreError::NotFound) => {
            errors::json_error(StatusCode::NOT_FOUND, "not_found", "Product not found")
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Deleting an id that is not in the sequence is a 200 no-op (and leaves the
/// document version untouched).
pub async fn delete_variant(
    Extension(services): Extension<Arc<AppServices>>,
    Path((id, variant_id)): Path<(String, String)>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };
    let variant_id: VariantId = match variant_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid variant id"),
    };

    match services
        .products
        .mutate_variants(id, |set| set.remove(variant_id))
        .await
    {
        Ok(_removed) => Json(serde_json::json!({ "message": "Variant deleted" })).into_response(),
        Err(StoreError::NotFound) => {
            errors::json_error(StatusCode::NOT_FOUND, "not_found", "Product not found")
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
