//! Tests for the Datadog reporter against a local fake intake.

#![cfg(feature = "http-server")]

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use parking_lot::Mutex;
use prometheus::Registry;
use serde_json::Value;
use tokio::sync::watch;

use meta_gateway::metrics::{DatadogReporter, RequestMetrics};

#[derive(Clone, Default)]
struct Intake {
    received: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn accept(State(intake): State<Intake>, headers: HeaderMap, Json(body): Json<Value>) -> StatusCode {
    let key = headers
        .get("DD-API-KEY")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    intake.received.lock().push((key, body));
    StatusCode::ACCEPTED
}

async fn reject() -> StatusCode {
    StatusCode::FORBIDDEN
}

/// Serve a fake intake and return its series endpoint.
async fn spawn_intake(intake: Intake) -> String {
    let app = Router::new()
        .route("/api/v1/series", post(accept))
        .route("/forbidden", post(reject))
        .with_state(intake);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api/v1/series", addr)
}

fn bare_metrics() -> RequestMetrics {
    RequestMetrics::with_registry(Registry::new()).unwrap()
}

fn recorded_metrics() -> RequestMetrics {
    let metrics = bare_metrics();
    metrics.observe("items", Duration::from_millis(100));
    metrics.observe("items", Duration::from_millis(300));
    metrics.observe("user", Duration::from_millis(50));
    metrics
}

#[tokio::test]
async fn test_report_posts_gauges_with_api_key() {
    let intake = Intake::default();
    let endpoint = spawn_intake(intake.clone()).await;
    let reporter =
        DatadogReporter::new("secret", "web-1", recorded_metrics()).with_endpoint(endpoint);

    reporter.report().await.unwrap();

    let received = intake.received.lock().clone();
    assert_eq!(received.len(), 1);
    let (key, body) = &received[0];
    assert_eq!(key.as_deref(), Some("secret"));

    let series = body["series"].as_array().unwrap();
    // count, mean, p50, p95, p99 for each of two routes
    assert_eq!(series.len(), 10);
    let items_count = series
        .iter()
        .find(|s| s["metric"] == "pr0gramm.meta.webapp.request.items.count")
        .unwrap();
    assert_eq!(items_count["type"], "gauge");
    assert_eq!(items_count["host"], "web-1");
    assert_eq!(items_count["points"][0][1], 2.0);

    let items_mean = series
        .iter()
        .find(|s| s["metric"] == "pr0gramm.meta.webapp.request.items.mean")
        .unwrap();
    let mean = items_mean["points"][0][1].as_f64().unwrap();
    assert!((mean - 0.2).abs() < 1e-9);
}

#[tokio::test]
async fn test_report_without_routes_sends_nothing() {
    let intake = Intake::default();
    let endpoint = spawn_intake(intake.clone()).await;
    let reporter = DatadogReporter::new("secret", "web-1", bare_metrics()).with_endpoint(endpoint);

    reporter.report().await.unwrap();

    assert!(intake.received.lock().is_empty());
}

#[tokio::test]
async fn test_report_surfaces_rejection() {
    let endpoint = spawn_intake(Intake::default()).await;
    let reporter = DatadogReporter::new("wrong", "web-1", recorded_metrics())
        .with_endpoint(endpoint.replace("/api/v1/series", "/forbidden"));

    assert!(reporter.report().await.is_err());
}

#[tokio::test]
async fn test_run_reports_periodically_until_shutdown() {
    let intake = Intake::default();
    let endpoint = spawn_intake(intake.clone()).await;
    let reporter = DatadogReporter::new("secret", "web-1", recorded_metrics())
        .with_endpoint(endpoint)
        .with_period(Duration::from_millis(20));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(reporter.run(shutdown_rx));

    tokio::time::sleep(Duration::from_millis(150)).await;
    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("reporter stops after shutdown")
        .unwrap();

    assert!(!intake.received.lock().is_empty());
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_report_carries_process_gauges() {
    let intake = Intake::default();
    let endpoint = spawn_intake(intake.clone()).await;
    let reporter = DatadogReporter::new("secret", "web-1", RequestMetrics::new().unwrap())
        .with_endpoint(endpoint);

    reporter.report().await.unwrap();

    let received = intake.received.lock().clone();
    let series = received[0].1["series"].as_array().unwrap().clone();
    let resident = series
        .iter()
        .find(|s| s["metric"] == "pr0gramm.meta.webapp.process.resident_memory_bytes")
        .expect("resident memory is reported");
    assert!(resident["points"][0][1].as_f64().unwrap() > 0.0);
}
