//! Background startup helper for the binary.
//!
//! [`spawn_server`] binds eagerly, so an unusable address is reported to
//! the caller, then serves on a background Tokio task alongside the
//! refresh controller.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{ServerConfig, ServerError, bind, serve};
use crate::state::AppState;

/// Bind the listener and spawn the server on a background task.
///
/// The server runs until the runtime shuts down or the returned handle
/// is aborted.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address cannot be bound.
pub async fn spawn_server(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<JoinHandle<()>, ServerError> {
    let listener = bind(config).await?;

    let handle = tokio::spawn(async move {
        if let Err(e) = serve(listener, state).await {
            tracing::error!(error = %e, "Dashboard server exited with error");
        }
    });

    tracing::info!(host = %config.host, port = config.port, "Dashboard server spawned on background task");

    Ok(handle)
}
