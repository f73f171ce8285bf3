//! Dashboard controller for the earthquake dashboard.
//!
//! This crate polls the earthquake data endpoint, renders the summary and
//! closest-city tables, and runs a countdown to the predicted next
//! earthquake.
//!
//! # Architecture
//!
//! ```text
//! refresh timer (60 s) --+
//!                        +--> refresh() --> SnapshotSource --> Renderer --> DashboardView
//! manual trigger --------+                                       |
//!                                          countdown task (1 s) -+
//! ```
//!
//! # Modules
//!
//! - [`config`] -- YAML + environment configuration
//! - [`controller`] -- Refresh loop, stale-response guard, countdown ownership
//! - [`countdown`] -- Countdown state machine and wall clock
//! - [`error`] -- [`DashboardError`]
//! - [`labels`] -- Turkish and English label sets
//! - [`render`] -- `minijinja` table templates
//! - [`source`] -- [`SnapshotSource`] trait and the HTTP implementation
//! - [`view`] -- View model and patch broadcast
//!
//! [`DashboardError`]: error::DashboardError
//! [`SnapshotSource`]: source::SnapshotSource

pub mod config;
pub mod controller;
pub mod countdown;
pub mod error;
pub mod labels;
pub mod render;
pub mod source;
pub mod view;

// Re-export primary types for convenience.
pub use config::DashboardConfig;
pub use controller::{
    ControllerOptions, DashboardController, RefreshOutcome, RefreshTrigger, trigger_channel,
};
pub use error::DashboardError;
pub use labels::Labels;
pub use render::Renderer;
pub use source::{HttpSource, SnapshotSource};
pub use view::{DashboardView, ResultArea, ViewPatch, ViewState};
