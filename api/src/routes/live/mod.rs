//! Pass-through view of the agent's current document.
//!
//! Unlike the stored-metrics routes these hit the agent on every request, and
//! they never fail hard: when the agent is unreachable the handlers answer
//! with a placeholder document so a dashboard can still render.

use axum::{Router, routing::get};
use util::state::AppState;

pub mod get;

/// Builds the `/live` route group.
///
/// Routes:
/// - `GET /live`           → the full agent document
/// - `GET /live/processes` → just its process list
pub fn live_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get::get_live))
        .route("/processes", get(get::get_live_processes))
}
