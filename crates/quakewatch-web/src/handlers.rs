//! HTTP endpoint handlers for the dashboard.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Dashboard page |
//! | `POST` | `/refresh` | Manual refresh trigger |
//! | `GET` | `/api/view` | Current view state as JSON |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::{Html, Redirect};
use quakewatch_dashboard::{RefreshTrigger, ViewState};

use crate::error::WebError;
use crate::state::AppState;

/// Serve the dashboard page rendered from the current view state.
pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, WebError> {
    let view = state.view.snapshot().await;
    let page = state.page.render(&view)?;
    Ok(Html(page))
}

/// Request an immediate refresh.
///
/// Every request enqueues one trigger; repeated presses are not merged.
/// Responds with `303 See Other` back to `/` so a plain form submission
/// lands on the page again.
pub async fn trigger_refresh(State(state): State<Arc<AppState>>) -> Result<Redirect, WebError> {
    state
        .triggers
        .send(RefreshTrigger)
        .await
        .map_err(|e| WebError::Unavailable(format!("controller has stopped: {e}")))?;
    tracing::debug!("manual refresh requested");
    Ok(Redirect::to("/"))
}

/// Return the full view state.
pub async fn get_view(State(state): State<Arc<AppState>>) -> Json<ViewState> {
    Json(state.view.snapshot().await)
}
