use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::{Value, json};
use services::FetchError;
use services::metrics_source::MetricsSourceClient;
use util::{config, state::AppState};

use crate::response::ApiResponse;

pub const UNAVAILABLE_MESSAGE: &str = "Unable to fetch system metrics";

/// Placeholder served in place of the agent document.
pub fn degraded_document() -> Value {
    json!({
        "error": UNAVAILABLE_MESSAGE,
        "cpu": { "overall_usage": 0 },
        "memory": { "percent_used": 0 },
        "disk": { "partitions": [] },
        "processes": []
    })
}

fn failure_status(e: &FetchError) -> StatusCode {
    match e {
        FetchError::Status { .. } | FetchError::Decode { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn fetch_live(app_state: &AppState) -> Result<Value, FetchError> {
    MetricsSourceClient::with_client(app_state.http().clone(), config::metrics_api_url())
        .fetch()
        .await
}

/// GET /api/live
///
/// Proxies the agent's `/metrics` document.
///
/// ### Responses
/// - `200 OK` - `data` is the agent document as-is
/// - `502 Bad Gateway` - Agent answered with an error status or invalid JSON
/// - `503 Service Unavailable` - Agent unreachable or timed out
///
/// On failure `data` still holds a placeholder document:
/// ```json
/// {
///   "success": false,
///   "data": {
///     "error": "Unable to fetch system metrics",
///     "cpu": { "overall_usage": 0 },
///     "memory": { "percent_used": 0 },
///     "disk": { "partitions": [] },
///     "processes": []
///   },
///   "message": "Unable to fetch system metrics"
/// }
/// ```
pub async fn get_live(State(app_state): State<AppState>) -> impl IntoResponse {
    match fetch_live(&app_state).await {
        Ok(doc) => (
            StatusCode::OK,
            Json(ApiResponse::success(doc, "Live metrics retrieved successfully")),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "live metrics unavailable");
            (
                failure_status(&e),
                Json(ApiResponse::failure(degraded_document(), UNAVAILABLE_MESSAGE)),
            )
        }
    }
}

/// GET /api/live/processes
///
/// The agent's process list (sorted by CPU, highest first). Empty when the
/// agent cannot be reached or reports no processes.
pub async fn get_live_processes(State(app_state): State<AppState>) -> impl IntoResponse {
    match fetch_live(&app_state).await {
        Ok(mut doc) => {
            let processes = match doc.get_mut("processes").map(Value::take) {
                Some(Value::Array(list)) => list,
                _ => Vec::new(),
            };
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    processes,
                    "Processes retrieved successfully",
                )),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, "live processes unavailable");
            (
                failure_status(&e),
                Json(ApiResponse::<Vec<Value>>::failure(Vec::new(), UNAVAILABLE_MESSAGE)),
            )
        }
    }
}
