//! End-to-end tests of the HTTP API against an in-memory display.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::Router;
use brightsync::server::{router, SharedController};
use brightsync::{BrightnessBackend, BrightnessController, Config, MemoryBackend};
use http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app_with(backend: MemoryBackend) -> (Router, SharedController) {
    let mut config = Config::default();
    config.transition.delay_ms = 0;
    let controller: SharedController = Arc::new(BrightnessController::new(
        Box::new(backend) as Box<dyn BrightnessBackend>,
        config,
    ));
    (router(Arc::clone(&controller)), controller)
}

fn app(initial: u8) -> (Router, SharedController) {
    app_with(MemoryBackend::new(initial))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_reports_current_brightness() {
    let (app, _) = app(42);
    let (status, body) = send(app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["current_brightness"], 42);
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn get_brightness() {
    let (app, _) = app(64);
    let (status, body) = send(app, get("/brightness")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_brightness"], 64);
}

#[tokio::test]
async fn get_brightness_read_failure_reports_default() {
    let (app, _) = app_with(MemoryBackend::new(64).failing_reads());
    let (status, body) = send(app, get("/brightness")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_brightness"], 50);
}

#[tokio::test]
async fn health_survives_read_failure() {
    let (app, _) = app_with(MemoryBackend::new(64).failing_reads());
    let (status, body) = send(app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_brightness"], 50);
}

#[tokio::test]
async fn set_from_phone_fraction() {
    let (app, controller) = app(30);
    let (status, body) = send(app, post("/brightness", r#"{"brightness": 0.5}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["brightness_set"], 68);
    assert_eq!(body["previous_brightness"], 30);
    assert_eq!(controller.current_brightness(), 68);
}

#[tokio::test]
async fn set_from_percentage_string() {
    let (app, _) = app(30);
    let (status, body) = send(app, post("/brightness", r#"{"brightness": "50"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["brightness_set"], 68);
}

#[tokio::test]
async fn set_from_boolean_brightness() {
    let (app, _) = app(30);
    let (status, body) = send(app, post("/brightness", r#"{"brightness": true}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["brightness_set"], 95);
}

#[tokio::test]
async fn set_mid_segment_fraction_truncates() {
    let (app, _) = app(30);
    let (status, body) = send(app, post("/brightness", r#"{"brightness": 0.33}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["brightness_set"], 48);
}

#[tokio::test]
async fn set_from_level_without_fade() {
    let (app, controller) = app(30);
    let (status, body) = send(
        app,
        post("/brightness", r#"{"level": "BRIGHT", "smooth": false}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["brightness_set"], 80);
    assert_eq!(controller.current_brightness(), 80);
}

#[tokio::test]
async fn set_from_lux() {
    let (app, _) = app(30);
    let (status, body) = send(app, post("/brightness", r#"{"lux": 1500}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["brightness_set"], 50);
}

#[tokio::test]
async fn set_time_based() {
    let (app, _) = app(30);
    let (status, body) = send(app, post("/brightness", r#"{"time_based": true}"#)).await;
    assert_eq!(status, StatusCode::OK);
    let set = body["brightness_set"].as_u64().unwrap();
    assert!([10, 22, 40, 60, 80, 95].contains(&set), "got {}", set);
}

#[tokio::test]
async fn shortcuts_wrapped_payload() {
    let (app, _) = app(30);
    let (status, body) = send(app, post("/brightness", r#"{"": {"level": "dim"}}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["brightness_set"], 40);
}

#[tokio::test]
async fn bad_requests() {
    let cases = [
        ("", "No JSON data provided"),
        ("{}", "No JSON data provided"),
        ("[]", "No JSON data provided"),
        (r#"{"brightness": "very"}"#, "Invalid brightness value"),
        (r#"{"volume": 3}"#, "Invalid brightness data"),
        ("{not json", "Malformed JSON body"),
    ];
    for (payload, expected) in cases {
        let (app, _) = app(30);
        let (status, body) = send(app, post("/brightness", payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {:?}", payload);
        assert!(
            body["error"].as_str().unwrap().contains(expected),
            "payload {:?} gave {}",
            payload,
            body
        );
    }
}

#[tokio::test]
async fn write_failure_is_500() {
    let (app, _) = app_with(MemoryBackend::new(30).failing_writes());
    let (status, body) = send(app, post("/brightness", r#"{"level": "dim"}"#)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("simulated write failure"));
}

#[tokio::test]
async fn auto_applies_schedule() {
    let (app, controller) = app(30);
    let (status, body) = send(app, post("/auto", "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "time_based");
    assert_eq!(
        body["brightness_set"].as_u64().unwrap(),
        u64::from(controller.current_brightness())
    );
}

#[tokio::test]
async fn config_endpoint() {
    let (app, _) = app(30);
    let (status, body) = send(app, get("/config")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["port"], 5000);
    assert_eq!(body["calibration"]["curve"], "lut");
    assert_eq!(body["schedule"]["windows"][0]["name"], "night");
}
