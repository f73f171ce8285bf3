//! Error types for the dashboard controller.
//!
//! Uses `thiserror` for typed errors that surface through the refresh
//! pipeline: configuration, the data request, payload decoding, and
//! table rendering.

/// Errors that can occur while configuring or running the dashboard.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// Configuration is invalid or could not be read.
    #[error("config error: {0}")]
    Config(String),

    /// The data request failed before a decodable body arrived.
    #[error("request failed: {0}")]
    Fetch(String),

    /// The response body was not a valid payload.
    #[error("invalid response: {0}")]
    Decode(String),

    /// A table template failed to load or render.
    #[error("template render error: {0}")]
    Template(String),
}

impl From<serde_json::Error> for DashboardError {
    fn from(source: serde_json::Error) -> Self {
        Self::Decode(source.to_string())
    }
}

impl From<minijinja::Error> for DashboardError {
    fn from(source: minijinja::Error) -> Self {
        Self::Template(source.to_string())
    }
}
