//! Integration tests for the refresh timer and manual trigger loop.
//!
//! The runtime clock is paused, so the 60 second cadence is exercised by
//! advancing time explicitly instead of waiting.

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use quakewatch_dashboard::controller::ControllerOptions;
use quakewatch_dashboard::countdown::WallClock;
use quakewatch_dashboard::labels::EN;
use quakewatch_dashboard::{
    DashboardController, DashboardError, DashboardView, Renderer, ResultArea, SnapshotSource,
    trigger_channel,
};
use quakewatch_types::DataResponse;

/// Counts fetches and always answers with a logical error.
#[derive(Clone, Default)]
struct CountingSource {
    fetches: Arc<AtomicUsize>,
}

impl SnapshotSource for CountingSource {
    async fn fetch(&self) -> Result<DataResponse, DashboardError> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(DataResponse::Failure(format!("fetch #{n}")))
    }

    fn describe(&self) -> &str {
        "counting"
    }
}

fn controller(source: CountingSource) -> Arc<DashboardController<CountingSource>> {
    let options = ControllerOptions {
        refresh_interval: Duration::from_secs(60),
        countdown_interval: Duration::from_secs(1),
        clock: WallClock::System,
    };
    Arc::new(DashboardController::new(
        source,
        Renderer::new(&EN).unwrap(),
        DashboardView::new(&EN),
        options,
    ))
}

async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

async fn advance(secs: u64) {
    tokio::time::advance(Duration::from_secs(secs)).await;
    settle().await;
}

#[tokio::test(start_paused = true)]
async fn startup_fetches_immediately_then_every_minute() {
    let source = CountingSource::default();
    let fetches = Arc::clone(&source.fetches);
    let c = controller(source);
    let (_tx, rx) = trigger_channel();

    tokio::spawn(Arc::clone(&c).run(rx));
    settle().await;
    assert_eq!(fetches.load(Ordering::SeqCst), 1, "eager startup fetch");

    advance(59).await;
    assert_eq!(fetches.load(Ordering::SeqCst), 1);

    advance(1).await;
    assert_eq!(fetches.load(Ordering::SeqCst), 2, "one more after 60 000 ms");

    advance(60).await;
    assert_eq!(fetches.load(Ordering::SeqCst), 3);

    let state = c.view().snapshot().await;
    assert_eq!(state.result, ResultArea::Text("fetch #3".to_owned()));
}

#[tokio::test(start_paused = true)]
async fn manual_trigger_fetches_without_waiting() {
    let source = CountingSource::default();
    let fetches = Arc::clone(&source.fetches);
    let c = controller(source);
    let (tx, rx) = trigger_channel();

    tokio::spawn(Arc::clone(&c).run(rx));
    settle().await;

    tx.send(quakewatch_dashboard::RefreshTrigger).await.unwrap();
    tx.send(quakewatch_dashboard::RefreshTrigger).await.unwrap();
    settle().await;
    assert_eq!(fetches.load(Ordering::SeqCst), 3, "no debouncing");

    // Manual refreshes do not reset the periodic cadence.
    advance(60).await;
    assert_eq!(fetches.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn closed_trigger_channel_keeps_the_timer_running() {
    let source = CountingSource::default();
    let fetches = Arc::clone(&source.fetches);
    let c = controller(source);
    let (tx, rx) = trigger_channel();

    tokio::spawn(Arc::clone(&c).run(rx));
    drop(tx);
    settle().await;
    assert_eq!(fetches.load(Ordering::SeqCst), 1);

    advance(60).await;
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
    assert_eq!(c.view().snapshot().await.trigger_label, "Fetch Data");
}
