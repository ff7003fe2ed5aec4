use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use serde::Deserialize;

use exportdesk_rates::{UsdRate, UsdRateId, local_day_bounds, parse_day};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

const DEFAULT_HISTORY_LIMIT: i64 = 30;

pub fn router() -> Router {
    Router::new()
        .route("/", get(current_rate).post(create_rate))
        .route("/history", get(rate_history))
        .route("/date/:date", get(rate_for_date))
        .route("/:id", put(update_rate).delete(delete_rate))
}

/// The slim shape the frontend binds to its currency field.
fn rate_summary(message: Option<&str>, rate: &UsdRate) -> serde_json::Value {
    match message {
        Some(message) => serde_json::json!({
            "message": message,
            "rate": rate.rate,
            "date": rate.date,
            "updated_at": rate.updated_at,
        }),
        None => serde_json::json!({
            "rate": rate.rate,
            "date": rate.date,
            "updated_at": rate.updated_at,
        }),
    }
}

pub async fn current_rate(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.usd_rates.latest().await {
        Ok(Some(rate)) => Json(rate_summary(None, &rate)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "No USD rate found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    limit: Option<String>,
}

pub async fn rate_history(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<HistoryParams>,
) -> axum::response::Response {
    let limit = params
        .limit
        .as_deref()
        .and_then(|raw| raw.parse::<i64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_HISTORY_LIMIT);
    match services.usd_rates.history(limit).await {
        Ok(rates) => Json(rates).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn rate_for_date(
    Extension(services): Extension<Arc<AppServices>>,
    Path(date): Path<String>,
) -> axum::response::Response {
    let day = match parse_day(&date) {
        Ok(day) => day,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_date",
                "expected date in YYYY-MM-DD format",
            );
        }
    };
    let (start, end) = local_day_bounds(day);
    match services.usd_rates.latest_in_range(start, end).await {
        Ok(Some(rate)) => Json(rate).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "No rate found for this date"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_rate(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::UsdRateRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::require_json(body) {
        Ok(body) => body,
        Err(resp) => return resp,
    };

    let draft = body.into_draft();
    if let Err(e) = draft.validate() {
        return errors::domain_error_to_response(e);
    }

    match services.usd_rates.insert(draft).await {
        Ok(rate) => (
            StatusCode::CREATED,
            Json(rate_summary(Some("USD rate updated successfully"), &rate)),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_rate(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::UsdRateRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: UsdRateId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid rate id"),
    };
    let body = match errors::require_json(body) {
        Ok(body) => body,
        Err(resp) => return resp,
    };

    let draft = body.into_draft();
    if let Err(e) = draft.validate() {
        return errors::domain_error_to_response(e);
    }

    match services.usd_rates.update(id, draft).await {
        Ok(Some(rate)) => Json(rate_summary(Some("USD rate updated successfully"), &rate)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "Rate entry not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_rate(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: UsdRateId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid rate id"),
    };
    match services.usd_rates.delete(id).await {
        Ok(_) => {
            Json(serde_json::json!({ "message": "Rate entry deleted successfully" })).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
