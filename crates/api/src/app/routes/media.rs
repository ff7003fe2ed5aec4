use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/:bucket/:filename", get(serve_object))
}

/// Serve an uploaded object. Names are store-generated, so anything that is
/// not a plain object name (path escapes included) is just a miss.
pub async fn serve_object(
    Extension(services): Extension<Arc<AppServices>>,
    Path((bucket, filename)): Path<(String, String)>,
) -> axum::response::Response {
    match services.media.get(&bucket, &filename).await {
        Ok(Some(object)) => {
            ([(header::CONTENT_TYPE, object.content_type)], object.bytes).into_response()
        }
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "File not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}
