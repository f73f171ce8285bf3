//! Web surface for the earthquake dashboard.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Dashboard page** (`GET /`) rendered from the current view state
//! - **Manual refresh** (`POST /refresh`) feeding the controller's
//!   trigger channel
//! - **View API** (`GET /api/view`) returning the view state as JSON
//! - **`WebSocket` endpoint** (`/ws/view`) streaming view patches as the
//!   controller applies them
//!
//! The server never talks to the earthquake data endpoint itself. It
//! reads the shared [`DashboardView`](quakewatch_dashboard::DashboardView)
//! and writes only to the trigger channel.

pub mod error;
pub mod handlers;
pub mod page;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use error::WebError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError};
pub use startup::spawn_server;
pub use state::AppState;
