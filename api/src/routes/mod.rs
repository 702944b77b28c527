//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → liveness probe
//! - `/hosts` → registered hosts and their samples
//! - `/metrics` → filtered samples, summaries, CSV export
//! - `/live` → pass-through of the agent's current document

use axum::Router;
use util::state::AppState;

use crate::routes::{
    health::health_routes, hosts::hosts_routes, live::live_routes, metrics::metrics_routes,
};

pub mod health;
pub mod hosts;
pub mod live;
pub mod metrics;

/// Builds the complete application router for all HTTP endpoints.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest("/hosts", hosts_routes())
        .nest("/metrics", metrics_routes())
        .nest("/live", live_routes())
        .with_state(app_state)
}
