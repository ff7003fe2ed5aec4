use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use serde::Deserialize;

use exportdesk_rates::{FreightRateId, local_day_bounds, parse_day};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

const DEFAULT_LIST_LIMIT: i64 = 100;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_rates).post(create_rate))
        .route("/country/:country", get(list_rates_for_country))
        .route("/country/:country/latest", get(latest_rate_for_country))
        .route(
            "/country/:country/airport/:code/latest",
            get(latest_rate_for_airport),
        )
        .route("/date/:date/country/:country", get(rate_for_date))
        .route(
            "/date/:date/country/:country/airport/:code",
            get(rate_for_date_and_airport),
        )
        .route("/:id", put(update_rate).delete(delete_rate))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    limit: Option<String>,
}

impl ListParams {
    /// Anything that is not a positive integer falls back to the default.
    fn limit_or(&self, default: i64) -> i64 {
        self.limit
            .as_deref()
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(default)
    }
}

pub async fn list_rates(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<ListParams>,
) -> axum::response::Response {
    match services.freight_rates.list(params.limit_or(DEFAULT_LIST_LIMIT)).await {
        Ok(rates) => Json(rates).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_rates_for_country(
    Extension(services): Extension<Arc<AppServices>>,
    Path(country): Path<String>,
) -> axum::response::Response {
    match services.freight_rates.list_for_country(&country).await {
        Ok(rates) => Json(rates).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn latest_rate_for_country(
    Extension(services): Extension<Arc<AppServices>>,
    Path(country): Path<String>,
) -> axum::response::Response {
    match services.freight_rates.latest_for_country(&country).await {
        Ok(Some(rate)) => Json(rate).into_response(),
        Ok(None) => errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            "No rate found for this country",
        ),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn latest_rate_for_airport(
    Extension(services): Extension<Arc<AppServices>>,
    Path((country, code)): Path<(String, String)>,
) -> axum::response::Response {
    // Codes are stored uppercased; accept any casing in the path.
    let code = code.trim().to_uppercase();
    match services.freight_rates.latest_for_airport(&country, &code).await {
        Ok(Some(rate)) => Json(rate).into_response(),
        Ok(None) => errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            "No rate found for this country and airport",
        ),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn rate_for_date(
    Extension(services): Extension<Arc<AppServices>>,
    Path((date, country)): Path<(String, String)>,
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
    match services.freight_rates.latest_in_range(start, end, &country, None).await {
        Ok(Some(rate)) => Json(rate).into_response(),
        Ok(None) => errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            "No rate found for this date and country",
        ),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn rate_for_date_and_airport(
    Extension(services): Extension<Arc<AppServices>>,
    Path((date, country, code)): Path<(String, String, String)>,
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
    let code = code.trim().to_uppercase();
    let (start, end) = local_day_bounds(day);
    match services
        .freight_rates
        .latest_in_range(start, end, &country, Some(&code))
        .await
    {
        Ok(Some(rate)) => Json(rate).into_response(),
        Ok(None) => errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            "No rate found for this date, country, and airport",
        ),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_rate(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::FreightRateRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::require_json(body) {
        Ok(body) => body,
        Err(resp) => return resp,
    };

    let draft = body.into_draft().normalized();
    if let Err(e) = draft.validate() {
        return errors::domain_error_to_response(e);
    }

    match services.freight_rates.insert(draft).await {
        Ok(rate) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "message": "Freight rate added successfully",
                "data": rate,
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_rate(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::FreightRateRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: FreightRateId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid rate id"),
    };
    let body = match errors::require_json(body) {
        Ok(body) => body,
        Err(resp) => return resp,
    };

    let draft = body.into_draft().normalized();
    if let Err(e) = draft.validate() {
        return errors::domain_error_to_response(e);
    }

    match services.freight_rates.update(id, draft).await {
        Ok(Some(rate)) => Json(serde_json::json!({
            "message": "Freight rate updated successfully",
            "data": rate,
        }))
        .into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "Freight rate not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_rate(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: FreightRateId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid rate id"),
    };
    match services.freight_rates.delete(id).await {
        Ok(_) => {
            Json(serde_json::json!({ "message": "Freight rate deleted successfully" })).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
