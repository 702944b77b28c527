use std::time::Duration;

use api::routes::routes;
use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use db::test_utils::setup_test_db;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tower::ServiceExt;
use util::state::AppState;

/// Router mounted under `/api` on a fresh in-memory database.
pub async fn make_test_app() -> (Router, DatabaseConnection) {
    let db = setup_test_db().await;
    let state = AppState::new(db.clone(), Duration::from_secs(2));
    let app = Router::new().nest("/api", routes(state));
    (app, db)
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(req).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
