//! Snapshot sources: where the controller gets its data.
//!
//! [`SnapshotSource`] abstracts the fetch so the controller can be driven
//! by the real HTTP endpoint or by a scripted source in tests. The trait is
//! used through generics, never as a trait object, so its async method
//! needs no boxing.

use std::future::Future;

use quakewatch_types::DataResponse;
use tracing::debug;

use crate::config::SourceConfig;
use crate::error::DashboardError;

/// A source of earthquake data responses.
pub trait SnapshotSource: Send + Sync + 'static {
    /// Fetch one response.
    ///
    /// A logical error reported by the server is a successful fetch that
    /// yields [`DataResponse::Failure`]. Only transport and decoding
    /// failures are returned as `Err`.
    fn fetch(&self) -> impl Future<Output = Result<DataResponse, DashboardError>> + Send;

    /// Human-readable description for logging.
    fn describe(&self) -> &str;
}

/// Fetches snapshots from the HTTP data endpoint with `GET`.
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSource {
    /// Create a source for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &SourceConfig) -> Result<Self, DashboardError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| DashboardError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: config.data_url.clone(),
        })
    }
}

impl SnapshotSource for HttpSource {
    async fn fetch(&self) -> Result<DataResponse, DashboardError> {
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| DashboardError::Fetch(format!("GET {} failed: {e}", self.url)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DashboardError::Fetch(format!("failed to read body: {e}")))?;

        debug!(
            url = %self.url,
            status = status.as_u16(),
            bytes = body.len(),
            "data response received"
        );

        // The server attaches `{"error": ...}` bodies to 404 and 500 replies,
        // so the body is decoded before the status is judged.
        match DataResponse::from_json(&body) {
            Ok(DataResponse::Failure(text)) => Ok(DataResponse::Failure(text)),
            Ok(snapshot) if status.is_success() => Ok(snapshot),
            Ok(_) => Err(DashboardError::Fetch(format!("server returned {status}"))),
            Err(e) if status.is_success() => Err(DashboardError::from(e)),
            Err(_) => Err(DashboardError::Fetch(format!("server returned {status}"))),
        }
    }

    fn describe(&self) -> &str {
        &self.url
    }
}
