use std::net::SocketAddr;

use axum::{Json, Router, http::StatusCode, routing::get as get_route};
use serde_json::{Value, json};
use serial_test::serial;
use tokio::net::TcpListener;
use util::config::AppConfig;

use crate::helpers::{body_json, get, make_test_app};

async fn spawn_agent(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn agent_document() -> Value {
    json!({
        "hostname": "agent-host",
        "cpu": { "overall_usage": 42.0, "cores": 2 },
        "memory": { "percent_used": 61.0 },
        "disk": { "partitions": [] },
        "processes": [
            { "pid": 10, "name": "busy", "cpu_percent": 80.0 },
            { "pid": 11, "name": "idle", "cpu_percent": 0.0 }
        ]
    })
}

#[tokio::test]
#[serial]
async fn proxies_the_agent_document() {
    let agent = Router::new().route("/metrics", get_route(|| async { Json(agent_document()) }));
    let addr = spawn_agent(agent).await;
    AppConfig::set_metrics_api_url(format!("http://{addr}/metrics"));

    let (app, _db) = make_test_app().await;

    let response = get(&app, "/api/live").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["hostname"], "agent-host");
    assert_eq!(json["data"]["cpu"]["overall_usage"], 42.0);

    let json = body_json(get(&app, "/api/live/processes").await).await;
    let procs = json["data"].as_array().unwrap();
    assert_eq!(procs.len(), 2);
    assert_eq!(procs[0]["name"], "busy");

    AppConfig::reset();
}

#[tokio::test]
#[serial]
async fn unreachable_agent_yields_degraded_document() {
    AppConfig::set_metrics_api_url("http://127.0.0.1:9/metrics");
    let (app, _db) = make_test_app().await;

    let response = get(&app, "/api/live").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["data"]["error"], "Unable to fetch system metrics");
    assert_eq!(json["data"]["cpu"]["overall_usage"], 0);
    assert_eq!(json["data"]["disk"]["partitions"], json!([]));

    let response = get(&app, "/api/live/processes").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["data"], json!([]));

    AppConfig::reset();
}

#[tokio::test]
#[serial]
async fn agent_error_status_is_a_bad_gateway() {
    let agent = Router::new().route(
        "/metrics",
        get_route(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let addr = spawn_agent(agent).await;
    AppConfig::set_metrics_api_url(format!("http://{addr}/metrics"));

    let (app, _db) = make_test_app().await;
    let response = get(&app, "/api/live").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["data"]["memory"]["percent_used"], 0);

    AppConfig::reset();
}
