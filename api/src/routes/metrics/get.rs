use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use services::summary::{self, MetricView, MetricsSummary};
use util::state::AppState;

use super::common::MetricsQuery;
use crate::response::ApiResponse;

/// GET /api/metrics?hostname=&days=
///
/// Lists samples from the last `days` days (default 1), newest first. Each row
/// carries its `hostname`. An unknown hostname yields an empty list.
///
/// ### Responses
/// - `200 OK`
/// ```json
/// {
///   "success": true,
///   "data": [
///     {
///       "id": 12, "host_id": 1, "hostname": "web-1",
///       "timestamp": "2025-10-18T09:00:00Z",
///       "cpu_usage": 25.5, "memory_total": 8589934592, "memory_used": 4294967296,
///       "memory_percent": 50.0, "disk_total": 107374182400, "disk_used": 32212254720,
///       "disk_percent": 30.0
///     }
///   ],
///   "message": "Metrics retrieved successfully"
/// }
/// ```
/// - `500 Internal Server Error` - Database error
pub async fn get_metrics(
    State(app_state): State<AppState>,
    Query(query): Query<MetricsQuery>,
) -> impl IntoResponse {
    let days = query.days();

    match summary::list_metrics(app_state.db(), query.hostname(), days, Utc::now()).await {
        Ok(rows) => (
            StatusCode::OK,
            Json(ApiResponse::success(rows, "Metrics retrieved successfully")),
        ),
        Err(e) => {
            tracing::error!(days, error = %e, "failed to list metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Vec<MetricView>>::error("Failed to retrieve metrics")),
            )
        }
    }
}

/// GET /api/metrics/{metric_id}
///
/// ### Responses
/// - `200 OK` - The sample, tagged with its hostname
/// - `404 Not Found` - No sample with that id
/// - `500 Internal Server Error` - Database error
pub async fn get_metric(
    State(app_state): State<AppState>,
    Path(metric_id): Path<i64>,
) -> impl IntoResponse {
    match summary::find_metric(app_state.db(), metric_id).await {
        Ok(Some(metric)) => (
            StatusCode::OK,
            Json(ApiResponse::success(Some(metric), "Metric retrieved successfully")),
        ),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<Option<MetricView>>::error("Metric not found")),
        ),
        Err(e) => {
            tracing::error!(metric_id, error = %e, "failed to load metric");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Option<MetricView>>::error("Failed to retrieve metric")),
            )
        }
    }
}

/// GET /api/metrics/summary?hostname=&days=
///
/// Hourly averages plus overall min/avg/max over the window. With no samples
/// `overall_stats` is an empty object.
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "time_series": [
///       { "timestamp": "2025-10-18T09:00:00Z", "cpu_usage": 20.0, "memory_percent": 50.0, "disk_percent": 30.0 }
///     ],
///     "overall_stats": {
///       "cpu_usage": { "avg": 20.0, "max": 30.0, "min": 10.0 },
///       "memory_percent": { "avg": 50.0, "max": 60.0, "min": 40.0 },
///       "disk_percent": { "avg": 30.0, "max": 30.0, "min": 30.0 }
///     }
///   },
///   "message": "Summary generated successfully"
/// }
/// ```
pub async fn get_metrics_summary(
    State(app_state): State<AppState>,
    Query(query): Query<MetricsQuery>,
) -> impl IntoResponse {
    let days = query.days();

    match summary::summarize(app_state.db(), query.hostname(), days, Utc::now()).await {
        Ok(report) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                Some(report),
                "Summary generated successfully",
            )),
        ),
        Err(e) => {
            tracing::error!(days, error = %e, "failed to summarize metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Option<MetricsSummary>>::error(
                    "Failed to generate summary",
                )),
            )
        }
    }
}

/// GET /api/metrics/export?hostname=&days=
///
/// Downloads the hourly time series as `text/csv`.
pub async fn get_metrics_csv(
    State(app_state): State<AppState>,
    Query(query): Query<MetricsQuery>,
) -> Response {
    let days = query.days();

    let report = match summary::summarize(app_state.db(), query.hostname(), days, Utc::now()).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(days, error = %e, "failed to export metrics");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error("Failed to export metrics")),
            )
                .into_response();
        }
    };

    let csv = summary::time_series_csv(&report.time_series);

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/csv"));
    headers.insert(
        CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=system_metrics.csv"),
    );

    (headers, csv).into_response()
}
