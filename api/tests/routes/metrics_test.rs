use axum::http::{StatusCode, header};
use chrono::{Duration, Utc};
use db::models::{host, system_metric};
use db::test_utils::sample;
use serde_json::json;

use crate::helpers::{body_json, get, make_test_app};

#[tokio::test]
async fn filters_by_hostname_and_window() {
    let (app, db) = make_test_app().await;
    let a = host::Model::upsert(&db, "server1", "10.0.0.1", "Linux", 4).await.unwrap();
    let b = host::Model::upsert(&db, "server2", "10.0.0.2", "Linux", 4).await.unwrap();
    let now = Utc::now();

    system_metric::Model::append(&db, a.id, &sample(now - Duration::minutes(30), 25.0, 50.0, 30.0))
        .await
        .unwrap();
    system_metric::Model::append(&db, a.id, &sample(now - Duration::minutes(10), 27.0, 50.0, 30.0))
        .await
        .unwrap();
    system_metric::Model::append(&db, b.id, &sample(now - Duration::minutes(20), 35.0, 55.0, 40.0))
        .await
        .unwrap();
    system_metric::Model::append(&db, b.id, &sample(now - Duration::days(2), 99.0, 99.0, 99.0))
        .await
        .unwrap();

    let json = body_json(get(&app, "/api/metrics").await).await;
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["cpu_usage"], 27.0);
    assert_eq!(rows[0]["hostname"], "server1");

    let json = body_json(get(&app, "/api/metrics?hostname=server2&days=7").await).await;
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r["hostname"] == "server2"));

    let json = body_json(get(&app, "/api/metrics?hostname=&days=-1").await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn summary_of_empty_window_has_empty_stats() {
    let (app, _db) = make_test_app().await;

    let response = get(&app, "/api/metrics/summary").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"], json!({ "time_series": [], "overall_stats": {} }));
}

#[tokio::test]
async fn summary_reports_hourly_series_and_stats() {
    let (app, db) = make_test_app().await;
    let h = host::Model::upsert(&db, "server1", "10.0.0.1", "Linux", 4).await.unwrap();
    let now = Utc::now();
    for (offset, cpu) in [(5, 10.0), (6, 30.0)] {
        system_metric::Model::append(&db, h.id, &sample(now - Duration::hours(offset), cpu, 50.0, 30.0))
            .await
            .unwrap();
    }

    let json = body_json(get(&app, "/api/metrics/summary?hostname=server1").await).await;
    let series = json["data"]["time_series"].as_array().unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series[0]["cpu_usage"], 30.0);
    assert_eq!(series[1]["cpu_usage"], 10.0);

    let stats = &json["data"]["overall_stats"];
    assert_eq!(stats["cpu_usage"]["min"], 10.0);
    assert_eq!(stats["cpu_usage"]["max"], 30.0);
    assert_eq!(stats["cpu_usage"]["avg"], 20.0);
    assert_eq!(stats["memory_percent"]["avg"], 50.0);
}

#[tokio::test]
async fn export_returns_csv_attachment() {
    let (app, db) = make_test_app().await;
    let h = host::Model::upsert(&db, "server1", "10.0.0.1", "Linux", 4).await.unwrap();
    system_metric::Model::append(&db, h.id, &sample(Utc::now(), 12.5, 50.0, 30.0))
        .await
        .unwrap();

    let response = get(&app, "/api/metrics/export").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=system_metrics.csv"
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "timestamp,cpu_usage,memory_percent,disk_percent");
    assert_eq!(lines.len(), 2);
    assert!(lines[1].ends_with(",12.5000,50.0000,30.0000"));
}

#[tokio::test]
async fn oversized_and_zero_days_still_answer() {
    let (app, db) = make_test_app().await;
    let h = host::Model::upsert(&db, "server1", "10.0.0.1", "Linux", 4).await.unwrap();
    let now = Utc::now();
    system_metric::Model::append(&db, h.id, &sample(now - Duration::minutes(5), 10.0, 50.0, 30.0))
        .await
        .unwrap();
    system_metric::Model::append(&db, h.id, &sample(now - Duration::days(400), 90.0, 50.0, 30.0))
        .await
        .unwrap();

    let host_uri = format!("/api/hosts/{}/metrics?days=1000000000", h.id);
    for uri in [
        "/api/metrics?days=1000000000",
        "/api/metrics/summary?days=1000000000",
        "/api/metrics/export?days=99999999999999999999",
        host_uri.as_str(),
    ] {
        assert_eq!(get(&app, uri).await.status(), StatusCode::OK, "{uri}");
    }

    let json = body_json(get(&app, "/api/metrics?days=1000000000").await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);

    let json = body_json(get(&app, "/api/metrics?days=0").await).await;
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["cpu_usage"], 10.0);
}

#[tokio::test]
async fn single_metric_by_id() {
    let (app, db) = make_test_app().await;
    let h = host::Model::upsert(&db, "server1", "10.0.0.1", "Linux", 4).await.unwrap();
    let saved = system_metric::Model::append(&db, h.id, &sample(Utc::now(), 42.0, 50.0, 30.0))
        .await
        .unwrap();

    let response = get(&app, &format!("/api/metrics/{}", saved.id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], saved.id);
    assert_eq!(json["data"]["hostname"], "server1");
    assert_eq!(json["data"]["cpu_usage"], 42.0);

    let response = get(&app, &format!("/api/metrics/{}", saved.id + 1)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Metric not found");
}
