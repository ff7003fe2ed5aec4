use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Multipart, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};

use exportdesk_customers::CustomerId;
use exportdesk_store::CUSTOMER_IMAGES_BUCKET;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_customers))
        .route("/upload", post(create_customer))
        .route("/upload/:id", put(update_customer))
        .route("/:id", get(get_customer).delete(delete_customer))
}

pub async fn list_customers(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.customers.list().await {
        Ok(customers) => Json(customers).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CustomerId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid customer id"),
    };
    match services.customers.get(id).await {
        Ok(Some(customer)) => Json(customer).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "Customer not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_customer(
    Extension(services): Extension<Arc<AppServices>>,
    multipart: Multipart,
) -> axum::response::Response {
    let mut form = match dto::collect_customer_form(multipart).await {
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
        match services.media.put(CUSTOMER_IMAGES_BUCKET, &name, image.bytes).await {
            Ok(url) => draft.image_url = Some(url),
            Err(e) => return errors::store_error_to_response(e),
        }
    }

    match services.customers.insert(draft).await {
        Ok(customer) => (StatusCode::CREATED, Json(customer)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> axum::response::Response {
    let id: CustomerId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid customer id"),
    };

    let mut form = match dto::collect_customer_form(multipart).await {
        Ok(form) => form,
        Err(resp) => return resp,
    };

    let mut draft = form.draft(form.existing_image_url.clone());
    if let Err(e) = draft.validate() {
        return errors::domain_error_to_response(e);
    }

    if let Some(image) = form.image.take() {
        let name = exportdesk_store::media::object_name(&image.filename);
        match services.media.put(CUSTOMER_IMAGES_BUCKET, &name, image.bytes).await {
            Ok(url) => draft.image_url = Some(url),
            Err(e) => return errors::store_error_to_response(e),
        }
    }

    match services.customers.update(id, draft).await {
        Ok(Some(customer)) => Json(customer).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "Customer not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CustomerId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid customer id"),
    };
    match services.customers.delete(id).await {
        Ok(_) => Json(serde_json::json!({ "message": "Customer deleted" })).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
