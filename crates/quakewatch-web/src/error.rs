//! Error types for the dashboard web surface.
//!
//! [`WebError`] unifies handler failures into a single enum that converts
//! into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur while serving a request.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// The controller is no longer accepting manual triggers.
    #[error("refresh unavailable: {0}")]
    Unavailable(String),

    /// The page template failed to render.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// A serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Template(_) | Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
