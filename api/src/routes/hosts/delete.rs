use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use db::models::host::Model as Host;
use util::state::AppState;

use crate::response::ApiResponse;

/// DELETE /api/hosts/{host_id}
///
/// Removes a host together with all of its samples. A host that keeps
/// reporting is recreated by the next ingestion tick.
///
/// ### Responses
/// - `200 OK` - Host removed
/// - `404 Not Found` - No host with that id
/// - `500 Internal Server Error` - Database error
pub async fn delete_host(
    State(app_state): State<AppState>,
    Path(host_id): Path<i64>,
) -> impl IntoResponse {
    let db = app_state.db();

    match Host::find_by_id(db, host_id).await {
        Ok(Some(host)) => match Host::delete(db, host.id).await {
            Ok(()) => {
                tracing::info!(host_id, hostname = %host, "host deleted");
                (
                    StatusCode::OK,
                    Json(ApiResponse::<()>::success((), "Host deleted successfully")),
                )
            }
            Err(e) => {
                tracing::error!(host_id, error = %e, "failed to delete host");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::<()>::error("Failed to delete host")),
                )
            }
        },
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::error("Host not found")),
        ),
        Err(e) => {
            tracing::error!(host_id, error = %e, "failed to load host");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error("Failed to delete host")),
            )
        }
    }
}
