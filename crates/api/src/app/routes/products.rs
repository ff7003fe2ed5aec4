use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Multipart, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};

use exportdesk_catalog::ProductId;
use exportdesk_store::PRODUCT_IMAGES_BUCKET;

use crate::app::routes::variants;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products))
        .route("/upload", post(create_product))
        .route("/upload/:id", put(update_product))
        .route("/:id", get(get_product).delete(delete_product))
        .merge(variants::router())
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.products.list().await {
        Ok(products) => Json(products).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };
    match services.products.get(id).await {
        Ok(Some(product)) => Json(product).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "Product not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    multipart: Multipart,
) -> axum::response::Response {
    let mut form = match dto::collect_product_form(multipart).await {
        Ok(form) => form,
        Err(resp) => return resp,
    };

    // Validate before the image goes anywhere near storage; a rejected
    // request must not strand an object in the bucket.
    let mut draft = form.draft(None);
    if let Err(e) = draft.validate() {
        return errors::domain_error_to_response(e);
    }

    if let Some(image) = form.image.take() {
        let name = exportdesk_store::media::object_name(&image.filename);
        match services.media.put(PRODUCT_IMAGES_BUCKET, &name, image.bytes).await {
            Ok(url) => draft.image_url = Some(url),
            Err(e) => return errors::store_error_to_response(e),
        }
    }

    match services.products.insert(draft).await {
        Ok(product) => (StatusCode::CREATED, Json(product)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Full-document overwrite, variants array included. A fresh image part
/// replaces the stored URL, otherwise `existing_image_url` is kept.
pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };

    let mut form = match dto::collect_product_form(multipart).await {
        Ok(form) => form,
        Err(resp) => return resp,
    };

    let mut draft = form.draft(form.existing_image_url.clone());
    if let Err(e) = draft.validate() {
        return errors::domain_error_to_response(e);
    }

    if let Some(image) = form.image.take() {
        let name = exportdesk_store::media::object_name(&image.filename);
        match services.media.put(PRODUCT_IMAGES_BUCKET, &name, image.bytes).await {
            Ok(url) => draft.image_url = Some(url),
            Err(e) => return errors::store_error_to_response(e),
        }
    }

    match services.products.update(id, draft).await {
        Ok(Some(product)) => Json(product).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "Product not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };
    match services.products.delete(id).await {
        Ok(_) => Json(serde_json::json!({ "message": "Product deleted" })).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
