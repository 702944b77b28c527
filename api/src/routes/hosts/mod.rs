//! # Hosts Routes Module
//!
//! Routes for the `/api/hosts` endpoint group.
//!
//! ## Structure
//! - `get.rs` - host listing, host detail, per-host samples
//! - `delete.rs` - host removal (samples cascade)
//! - `common.rs` - response models

use axum::{
    Router,
    routing::{delete, get},
};
use util::state::AppState;

pub mod common;
pub mod delete;
pub mod get;

/// Builds the `/hosts` route group.
///
/// Routes:
/// - `GET    /hosts`                   → all hosts, ordered by id
/// - `GET    /hosts/{host_id}`         → a single host
/// - `GET    /hosts/{host_id}/metrics` → that host's samples (`?days=N`)
/// - `DELETE /hosts/{host_id}`         → remove a host and its samples
pub fn hosts_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get::get_hosts))
        .route("/{host_id}", get(get::get_host))
        .route("/{host_id}", delete(delete::delete_host))
        .route("/{host_id}/metrics", get(get::get_host_metrics))
}
