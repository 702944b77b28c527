use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::task;

use crate::collector;

pub fn routes() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/metrics", get(metrics))
        .route("/metrics/cpu", get(cpu))
        .route("/metrics/memory", get(memory))
        .route("/metrics/disk", get(disk))
        .route("/metrics/processes", get(processes))
}

/// Runs a blocking sampler off the async workers.
async fn sampled<T, F>(sample: F) -> Response
where
    T: Serialize + Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    match task::spawn_blocking(sample).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "sampling task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": format!("Error collecting metrics: {e}") })),
            )
                .into_response()
        }
    }
}

pub async fn index() -> Json<Value> {
    Json(json!({
        "message": "Linux Metrics Agent",
        "endpoints": {
            "/metrics": "Get full system metrics",
            "/metrics/cpu": "Get CPU metrics only",
            "/metrics/memory": "Get memory metrics only",
            "/metrics/disk": "Get disk metrics only",
            "/metrics/processes": "Get process information only"
        }
    }))
}

pub async fn metrics() -> Response {
    sampled(collector::sample_document).await
}

pub async fn cpu() -> Response {
    sampled(collector::sample_cpu).await
}

pub async fn memory() -> Response {
    sampled(collector::sample_memory).await
}

pub async fn disk() -> Response {
    sampled(collector::sample_disk).await
}

pub async fn processes() -> Response {
    sampled(collector::sample_processes).await
}
