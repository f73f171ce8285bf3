//! Axum router construction for the dashboard.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- dashboard page
/// - `POST /refresh` -- manual refresh trigger
/// - `GET /api/view` -- current view state
/// - `GET /ws/view` -- `WebSocket` patch stream
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/refresh", post(handlers::trigger_refresh))
        .route("/api/view", get(handlers::get_view))
        .route("/ws/view", get(ws::ws_view))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
