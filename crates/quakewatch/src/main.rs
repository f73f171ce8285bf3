//! Earthquake dashboard binary.
//!
//! Wires the refresh controller to the web surface and runs both until
//! `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `quakewatch.yaml` plus environment overrides
//! 3. Build the renderer, data source and view model
//! 4. Bind and spawn the web server
//! 5. Run the refresh controller (eager first fetch, then every interval)

use std::sync::Arc;

use anyhow::Context as _;
use quakewatch_dashboard::{
    ControllerOptions, DashboardConfig, DashboardController, DashboardView, HttpSource, Labels,
    Renderer, SnapshotSource as _, trigger_channel,
};
use quakewatch_web::{AppState, ServerConfig, spawn_server};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, template compilation or binding
/// the listen address fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("quakewatch starting");

    let config = DashboardConfig::load().context("failed to load configuration")?;
    info!(
        data_url = %config.source.data_url,
        refresh_interval_secs = config.timers.refresh_interval_secs,
        locale = ?config.display.locale,
        "Configuration loaded"
    );

    let labels = Labels::for_locale(config.display.locale);
    let renderer = match &config.display.template_dir {
        Some(dir) => Renderer::with_template_dir(labels, dir),
        None => Renderer::new(labels),
    }
    .context("failed to compile table templates")?;

    let source = HttpSource::new(&config.source).context("failed to build HTTP client")?;
    info!(source = source.describe(), "Data source ready");

    let view = DashboardView::new(labels);
    let (trigger_tx, trigger_rx) = trigger_channel();

    let app_state = Arc::new(
        AppState::new(view.clone(), trigger_tx, labels).context("failed to compile page template")?,
    );
    let server_config = ServerConfig::from(&config.server);
    let _server_handle = spawn_server(&server_config, app_state)
        .await
        .context("failed to start web server")?;

    let controller = Arc::new(DashboardController::new(
        source,
        renderer,
        view,
        ControllerOptions::from_config(&config.timers),
    ));

    tokio::select! {
        () = controller.run(trigger_rx) => {
            info!("Refresh controller stopped");
        }
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for Ctrl-C")?;
            info!("Shutdown requested");
        }
    }

    Ok(())
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` controls the filter (default `info`). Setting
/// `QUAKEWATCH_LOG_FORMAT=json` emits one JSON object per event.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("QUAKEWATCH_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}
