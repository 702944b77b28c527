use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use db::models::host::Model as Host;
use services::summary::{self, MetricView};
use util::state::AppState;

use super::common::{DaysQuery, HostResponse};
use crate::response::ApiResponse;

/// GET /api/hosts
///
/// Lists every known host in registration order.
///
/// ### Responses
/// - `200 OK`
/// ```json
/// {
///   "success": true,
///   "data": [
///     { "id": 1, "hostname": "web-1", "ip_address": "10.0.0.1", "os_info": "Linux 6.1", "cpu_cores": 4 }
///   ],
///   "message": "Hosts retrieved successfully"
/// }
/// ```
/// - `500 Internal Server Error` - Database error
pub async fn get_hosts(State(app_state): State<AppState>) -> impl IntoResponse {
    match Host::list(app_state.db()).await {
        Ok(hosts) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                hosts.into_iter().map(HostResponse::from).collect::<Vec<_>>(),
                "Hosts retrieved successfully",
            )),
        ),
        Err(e) => {
            tracing::error!(error = %e, "failed to list hosts");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Vec<HostResponse>>::error("Failed to retrieve hosts")),
            )
        }
    }
}

/// GET /api/hosts/{host_id}
///
/// ### Responses
/// - `200 OK` - Host found
/// - `404 Not Found` - No host with that id
/// - `500 Internal Server Error` - Database error
pub async fn get_host(
    State(app_state): State<AppState>,
    Path(host_id): Path<i64>,
) -> impl IntoResponse {
    match Host::find_by_id(app_state.db(), host_id).await {
        Ok(Some(host)) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                Some(HostResponse::from(host)),
                "Host retrieved successfully",
            )),
        ),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<Option<HostResponse>>::error("Host not found")),
        ),
        Err(e) => {
            tracing::error!(host_id, error = %e, "failed to load host");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Option<HostResponse>>::error("Failed to retrieve host")),
            )
        }
    }
}

/// GET /api/hosts/{host_id}/metrics?days=N
///
/// Samples recorded for one host over the last `days` days (default 1), newest first.
/// A missing, non-numeric or non-positive `days` is treated as 1.
///
/// ### Responses
/// - `200 OK` - Possibly empty list of samples
/// - `404 Not Found` - No host with that id
/// - `500 Internal Server Error` - Database error
pub async fn get_host_metrics(
    State(app_state): State<AppState>,
    Path(host_id): Path<i64>,
    Query(query): Query<DaysQuery>,
) -> Response {
    let days = summary::parse_days(query.days.as_deref());

    match summary::host_metrics(app_state.db(), host_id, days, Utc::now()).await {
        Ok(Some(rows)) => (
            StatusCode::OK,
            Json(ApiResponse::success(rows, "Metrics retrieved successfully")),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<Vec<MetricView>>::error("Host not found")),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(host_id, days, error = %e, "failed to load host metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Vec<MetricView>>::error("Failed to retrieve metrics")),
            )
                .into_response()
        }
    }
}
