//! Shared application state for the dashboard web surface.
//!
//! [`AppState`] holds the view model the controller writes to, the
//! sending half of the manual trigger channel, and the page renderer.

use quakewatch_dashboard::{DashboardView, Labels, RefreshTrigger};
use tokio::sync::mpsc;

use crate::page::PageRenderer;

/// Shared state for the Axum application.
///
/// Wrapped in [`std::sync::Arc`] and injected via Axum's `State`
/// extractor.
#[derive(Debug)]
pub struct AppState {
    /// The view model mirrored by the page.
    pub view: DashboardView,
    /// Manual trigger sender; the controller owns the receiver.
    pub triggers: mpsc::Sender<RefreshTrigger>,
    /// Full-page renderer.
    pub page: PageRenderer,
}

impl AppState {
    /// Create application state for a view and trigger channel.
    pub fn new(
        view: DashboardView,
        triggers: mpsc::Sender<RefreshTrigger>,
        labels: &'static Labels,
    ) -> Result<Self, minijinja::Error> {
        Ok(Self {
            view,
            triggers,
            page: PageRenderer::new(labels)?,
        })
    }
}
