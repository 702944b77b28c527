use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, Utc};
use db::models::{host, system_metric};
use db::test_utils::sample;
use sea_orm::{EntityTrait, PaginatorTrait};
use tower::ServiceExt;

use crate::helpers::{body_json, get, make_test_app};

#[tokio::test]
async fn lists_hosts_in_id_order() {
    let (app, db) = make_test_app().await;
    host::Model::upsert(&db, "server1", "192.168.1.101", "Ubuntu 20.04", 4)
        .await
        .unwrap();
    host::Model::upsert(&db, "server2", "192.168.1.102", "CentOS 8", 8)
        .await
        .unwrap();

    let response = get(&app, "/api/hosts").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["hostname"], "server1");
    assert_eq!(data[1]["hostname"], "server2");
    assert_eq!(data[1]["cpu_cores"], 8);
}

#[tokio::test]
async fn host_detail_and_not_found() {
    let (app, db) = make_test_app().await;
    let h = host::Model::upsert(&db, "server1", "192.168.1.101", "Ubuntu 20.04", 4)
        .await
        .unwrap();

    let response = get(&app, &format!("/api/hosts/{}", h.id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["ip_address"], "192.168.1.101");

    let response = get(&app, "/api/hosts/9999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Host not found");
}

#[tokio::test]
async fn host_metrics_honour_days_and_fall_back_on_junk() {
    let (app, db) = make_test_app().await;
    let h = host::Model::upsert(&db, "server1", "10.0.0.1", "Linux", 4).await.unwrap();
    let now = Utc::now();
    system_metric::Model::append(&db, h.id, &sample(now - Duration::hours(1), 25.0, 50.0, 30.0))
        .await
        .unwrap();
    system_metric::Model::append(&db, h.id, &sample(now - Duration::days(2), 35.0, 60.0, 40.0))
        .await
        .unwrap();

    let uri = |q: &str| format!("/api/hosts/{}/metrics{q}", h.id);

    let json = body_json(get(&app, &uri("")).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let json = body_json(get(&app, &uri("?days=3")).await).await;
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["cpu_usage"], 25.0);
    assert_eq!(rows[0]["hostname"], "server1");

    let response = get(&app, &uri("?days=abc")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);

    let response = get(&app, "/api/hosts/9999/metrics").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_host_removes_its_samples() {
    let (app, db) = make_test_app().await;
    let h = host::Model::upsert(&db, "doomed", "10.0.0.9", "Linux", 2).await.unwrap();
    system_metric::Model::append(&db, h.id, &sample(Utc::now(), 5.0, 10.0, 15.0))
        .await
        .unwrap();

    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/api/hosts/{}", h.id))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(host::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(system_metric::Entity::find().count(&db).await.unwrap(), 0);

    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/api/hosts/{}", h.id))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
