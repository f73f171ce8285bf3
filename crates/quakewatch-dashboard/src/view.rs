//! The dashboard view model.
//!
//! [`DashboardView`] stands in for the page's four UI elements: the
//! refresh trigger, the result container, the timer display, and the
//! closest-cities table body. Every mutation updates the in-memory
//! [`ViewState`] and is broadcast as a [`ViewPatch`], so a live page can
//! mirror the state without polling.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, broadcast};

use crate::labels::Labels;

/// Capacity of the patch broadcast channel.
///
/// A subscriber that falls further behind receives
/// [`broadcast::error::RecvError::Lagged`] and should reload the full
/// state.
const PATCH_CAPACITY: usize = 256;

/// Contents of the result container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResultArea {
    /// Nothing rendered yet.
    #[default]
    Empty,
    /// A rendered summary table.
    Html(String),
    /// Plain text (server error or request failure).
    Text(String),
}

/// Full state of the view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    /// Current text of the refresh trigger.
    pub trigger_label: String,
    /// Current contents of the result container.
    pub result: ResultArea,
    /// Current countdown text.
    pub timer_text: String,
    /// Rendered `<tr>` fragments of the closest-cities table, in order.
    pub city_rows: Vec<String>,
}

/// One mutation of the view, as sent to live clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "patch", rename_all = "snake_case")]
pub enum ViewPatch {
    /// Replace the whole view. Sent first on every new live connection.
    Replace {
        /// The full state.
        state: ViewState,
    },
    /// Replace the trigger text.
    TriggerLabel {
        /// New trigger text.
        text: String,
    },
    /// Replace the result container with HTML.
    ResultHtml {
        /// Rendered table.
        html: String,
    },
    /// Replace the result container with text.
    ResultText {
        /// Text shown verbatim.
        text: String,
    },
    /// Replace the timer text.
    TimerText {
        /// New countdown text.
        text: String,
    },
    /// Remove every closest-city row.
    CitiesCleared,
    /// Append one closest-city row.
    CityRowAppended {
        /// Rendered `<tr>` fragment.
        html: String,
    },
}

/// Shared, cloneable handle to the view model.
#[derive(Debug, Clone)]
pub struct DashboardView {
    state: Arc<RwLock<ViewState>>,
    tx: broadcast::Sender<ViewPatch>,
}

impl DashboardView {
    /// Create a view with an idle trigger and everything else empty.
    pub fn new(labels: &Labels) -> Self {
        let (tx, _) = broadcast::channel(PATCH_CAPACITY);
        let state = ViewState {
            trigger_label: labels.fetch_idle.to_owned(),
            result: ResultArea::Empty,
            timer_text: String::new(),
            city_rows: Vec::new(),
        };
        Self {
            state: Arc::new(RwLock::new(state)),
            tx,
        }
    }

    /// Clone of the current state.
    pub async fn snapshot(&self) -> ViewState {
        self.state.read().await.clone()
    }

    /// Subscribe to patches applied from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ViewPatch> {
        self.tx.subscribe()
    }

    /// The current state together with a subscription to every patch
    /// applied after it.
    ///
    /// No patch is both reflected in the returned state and delivered on
    /// the receiver, and none is missed between the two.
    pub async fn subscribe_with_state(&self) -> (ViewState, broadcast::Receiver<ViewPatch>) {
        let state = self.state.read().await;
        (state.clone(), self.tx.subscribe())
    }

    /// Apply a patch and broadcast it.
    ///
    /// The patch is sent while the state lock is still held, so
    /// [`subscribe_with_state`](Self::subscribe_with_state) sees each patch
    /// exactly once.
    pub async fn apply(&self, patch: ViewPatch) {
        let mut state = self.state.write().await;
        match &patch {
            ViewPatch::Replace { state: next } => state.clone_from(next),
            ViewPatch::TriggerLabel { text } => state.trigger_label.clone_from(text),
            ViewPatch::ResultHtml { html } => state.result = ResultArea::Html(html.clone()),
            ViewPatch::ResultText { text } => state.result = ResultArea::Text(text.clone()),
            ViewPatch::TimerText { text } => state.timer_text.clone_from(text),
            ViewPatch::CitiesCleared => state.city_rows.clear(),
            ViewPatch::CityRowAppended { html } => state.city_rows.push(html.clone()),
        }
        // send only fails when nobody is subscribed, which is normal.
        let _ = self.tx.send(patch);
    }

    /// Set the trigger text.
    pub async fn set_trigger_label(&self, text: &str) {
        self.apply(ViewPatch::TriggerLabel {
            text: text.to_owned(),
        })
        .await;
    }

    /// Replace the result container with a rendered table.
    pub async fn show_result_html(&self, html: String) {
        self.apply(ViewPatch::ResultHtml { html }).await;
    }

    /// Replace the result container with text.
    pub async fn show_result_text(&self, text: String) {
        self.apply(ViewPatch::ResultText { text }).await;
    }

    /// Set the countdown text.
    pub async fn set_timer_text(&self, text: String) {
        self.apply(ViewPatch::TimerText { text }).await;
    }

    /// Remove every closest-city row.
    pub async fn clear_cities(&self) {
        self.apply(ViewPatch::CitiesCleared).await;
    }

    /// Append one closest-city row.
    pub async fn append_city_row(&self, html: String) {
        self.apply(ViewPatch::CityRowAppended { html }).await;
    }
}
