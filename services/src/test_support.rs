use std::net::SocketAddr;

use axum::{Json, Router, routing::get};
use serde_json::Value;
use tokio::net::TcpListener;

/// Serves `app` on an ephemeral loopback port for the lifetime of the test runtime.
pub async fn serve_route(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Serves a fixed JSON body at `/metrics`.
pub async fn serve_json(body: Value) -> SocketAddr {
    let app = Router::new().route(
        "/metrics",
        get(move || {
            let body = body.clone();
            async move { Json(body) }
        }),
    );
    serve_route(app).await
}
