//! Integration tests for the dashboard HTTP endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use quakewatch_dashboard::labels::EN;
use quakewatch_dashboard::{DashboardView, RefreshTrigger, trigger_channel};
use quakewatch_web::router::build_router;
use quakewatch_web::state::AppState;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

fn make_state() -> (Arc<AppState>, mpsc::Receiver<RefreshTrigger>) {
    let (tx, rx) = trigger_channel();
    let state = AppState::new(DashboardView::new(&EN), tx, &EN).unwrap();
    (Arc::new(state), rx)
}

async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_to_json(body: Body) -> Value {
    serde_json::from_str(&body_to_string(body).await).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn index_renders_view_state() {
    let (state, _rx) = make_state();
    state
        .view
        .append_city_row(String::from("<tr><td>Sakarya</td></tr>"))
        .await;
    state.view.set_timer_text(String::from("0 days 1 hours 2 minutes 3 seconds")).await;

    let response = build_router(Arc::clone(&state)).oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_to_string(response.into_body()).await;
    assert!(html.contains("id=\"fetch-data\""));
    assert!(html.contains("id=\"closestCitiesTable\""));
    assert!(html.contains("<tr><td>Sakarya</td></tr>"));
    assert!(html.contains("0 days 1 hours 2 minutes 3 seconds"));
}

#[tokio::test]
async fn refresh_enqueues_one_trigger_per_request() {
    let (state, mut rx) = make_state();
    let app = build_router(state);

    for _ in 0..2 {
        let response = app.clone().oneshot(post("/refresh")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
    }

    assert!(rx.try_recv().is_ok());
    assert!(rx.try_recv().is_ok());
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn refresh_without_controller_is_unavailable() {
    let (state, rx) = make_state();
    drop(rx);

    let response = build_router(state).oneshot(post("/refresh")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 503);
    assert!(json["error"].as_str().unwrap().contains("refresh unavailable"));
}

#[tokio::test]
async fn refresh_rejects_get() {
    let (state, _rx) = make_state();
    let response = build_router(state).oneshot(get("/refresh")).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn view_api_returns_state() {
    let (state, _rx) = make_state();
    state.view.show_result_text(String::from("Sunucu hatası")).await;

    let response = build_router(state).oneshot(get("/api/view")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["trigger_label"], "Fetch Data");
    assert_eq!(json["result"]["kind"], "text");
    assert_eq!(json["result"]["value"], "Sunucu hatası");
    assert_eq!(json["city_rows"], serde_json::json!([]));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (state, _rx) = make_state();
    let response = build_router(state).oneshot(get("/api/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
