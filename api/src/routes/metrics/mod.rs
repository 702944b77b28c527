use axum::{Router, routing::get};
use util::state::AppState;

pub mod common;
pub mod get;

/// Builds the `/metrics` route group.
///
/// Routes:
/// - `GET /metrics`         → samples in the window, newest first
/// - `GET /metrics/summary` → hourly time series plus overall min/avg/max
/// - `GET /metrics/export`  → the hourly time series as CSV
/// - `GET /metrics/{metric_id}` → one sample
///
/// The first three accept `?hostname=<exact>&days=<N>`.
pub fn metrics_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get::get_metrics))
        .route("/summary", get(get::get_metrics_summary))
        .route("/export", get(get::get_metrics_csv))
        .route("/{metric_id}", get(get::get_metric))
}
