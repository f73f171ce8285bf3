//! `WebSocket` handler for live view updates.
//!
//! Clients connect to `GET /ws/view`. The first frame is a `replace`
//! patch carrying the full view state; after that every
//! [`ViewPatch`] is forwarded as JSON in the order the controller applied
//! it. Patches applied between the page load and the socket opening are
//! covered by the opening frame.
//!
//! A client that falls behind the broadcast buffer is resynced the same
//! way: it gets a fresh `replace` frame and a new subscription.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use quakewatch_dashboard::{DashboardView, ViewPatch};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming view patches.
///
/// # Route
///
/// `GET /ws/view`
pub async fn ws_view(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Subscribe to `view` and encode the `replace` frame matching the
/// subscription's starting point.
async fn resync(
    view: &DashboardView,
) -> Result<(String, broadcast::Receiver<ViewPatch>), serde_json::Error> {
    let (state, rx) = view.subscribe_with_state().await;
    let frame = serde_json::to_string(&ViewPatch::Replace { state })?;
    Ok((frame, rx))
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("WebSocket client connected");

    let (frame, mut rx) = match resync(&state.view).await {
        Ok(opening) => opening,
        Err(e) => {
            warn!("Failed to serialize view state: {e}");
            return;
        }
    };
    if socket.send(Message::Text(frame.into())).await.is_err() {
        debug!("WebSocket client disconnected (send failed)");
        return;
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                let json = match result {
                    Ok(patch) => match serde_json::to_string(&patch) {
                        Ok(j) => j,
                        Err(e) => {
                            warn!("Failed to serialize view patch: {e}");
                            continue;
                        }
                    },
                    Err(RecvError::Lagged(n)) => {
                        debug!(skipped = n, "WebSocket client lagged, resyncing");
                        match resync(&state.view).await {
                            Ok((frame, fresh)) => {
                                rx = fresh;
                                frame
                            }
                            Err(e) => {
                                warn!("Failed to serialize view state: {e}");
                                return;
                            }
                        }
                    }
                    Err(RecvError::Closed) => {
                        debug!("Patch channel closed, shutting down WebSocket");
                        return;
                    }
                };
                if socket.send(Message::Text(json.into())).await.is_err() {
                    debug!("WebSocket client disconnected (send failed)");
                    return;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {}
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use quakewatch_dashboard::labels::EN;
    use serde_json::Value;

    use super::*;

    #[tokio::test]
    async fn opening_frame_carries_state_applied_before_connect() {
        let view = DashboardView::new(&EN);
        view.set_trigger_label("Loading").await;
        view.show_result_text(String::from("Sunucu hatası")).await;

        let (frame, mut rx) = resync(&view).await.unwrap();
        let json: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(json["patch"], "replace");
        assert_eq!(json["state"]["trigger_label"], "Loading");
        assert_eq!(json["state"]["result"]["value"], "Sunucu hatası");

        // The fetch finishing after the connect reaches the client as a patch.
        view.set_trigger_label("Fetch Data").await;
        assert_eq!(
            rx.recv().await.unwrap(),
            ViewPatch::TriggerLabel {
                text: String::from("Fetch Data")
            }
        );
    }
}
