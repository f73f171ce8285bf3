//! Dashboard controller: the refresh cycle and the countdown it drives.
//!
//! The controller owns three things:
//!
//! 1. The outer refresh timer ([`DashboardController::run`]), which fires
//!    once immediately and then every refresh interval for the life of the
//!    process. Manual triggers arrive on an `mpsc` channel and start the
//!    same refresh.
//! 2. The refresh itself ([`DashboardController::refresh`]): fetch, then
//!    replace the view wholesale with what came back.
//! 3. The single countdown task. Every restart path aborts the previous
//!    task before storing the new handle, so two countdowns never tick at
//!    once.
//!
//! Each refresh runs as its own task, so fetches may overlap. Every
//! refresh takes a generation number when it starts; a response is only
//! shown if no newer one has been shown already, so a slow stale fetch
//! never overwrites fresher data.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use quakewatch_types::{DataResponse, EarthquakeSnapshot};
use tokio::sync::{Mutex, mpsc};
use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::TimerConfig;
use crate::countdown::{Countdown, Tick, WallClock};
use crate::error::DashboardError;
use crate::labels::Labels;
use crate::render::Renderer;
use crate::source::SnapshotSource;
use crate::view::DashboardView;

/// Capacity of the manual trigger channel.
pub const TRIGGER_CAPACITY: usize = 16;

/// A manual refresh request from the UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshTrigger;

/// Create the channel that carries manual triggers to [`DashboardController::run`].
pub fn trigger_channel() -> (mpsc::Sender<RefreshTrigger>, mpsc::Receiver<RefreshTrigger>) {
    mpsc::channel(TRIGGER_CAPACITY)
}

/// Why a refresh was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshReason {
    /// The eager refresh at startup.
    Startup,
    /// The periodic refresh timer.
    Timer,
    /// A manual trigger.
    Manual,
}

/// What a refresh did to the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A snapshot was rendered and the countdown restarted.
    Rendered,
    /// The server reported an error; its text is shown.
    ServerError,
    /// The request or decoding failed; the failure is shown.
    RequestFailed,
    /// The snapshot could not be rendered; the failure is shown.
    RenderFailed,
    /// A newer response was already shown; this one was dropped.
    Stale,
}

/// Timer cadence and clock used by the controller.
#[derive(Debug, Clone, Copy)]
pub struct ControllerOptions {
    /// Interval of the outer refresh timer.
    pub refresh_interval: Duration,
    /// Interval of the countdown task.
    pub countdown_interval: Duration,
    /// Wall clock the countdown reads.
    pub clock: WallClock,
}

impl ControllerOptions {
    /// Options from the timer configuration, reading the system clock.
    pub const fn from_config(config: &TimerConfig) -> Self {
        Self {
            refresh_interval: config.refresh_interval(),
            countdown_interval: config.countdown_interval(),
            clock: WallClock::System,
        }
    }
}

/// Bookkeeping shared by concurrent refreshes.
#[derive(Debug, Default)]
struct RefreshBook {
    /// Last generation handed out.
    issued: u64,
    /// Generation of the response currently shown.
    shown: u64,
    /// Refreshes started but not yet finished.
    in_flight: usize,
    /// The live countdown task, if any.
    countdown: Option<AbortHandle>,
}

/// Which countdown may write the timer text.
///
/// Aborting a task that is mid-poll on another worker does not stop it
/// immediately, so each countdown checks its id against the epoch under
/// the lock before every write. A restart bumps the epoch first.
type CountdownEpoch = Arc<Mutex<u64>>;

/// The dashboard controller.
pub struct DashboardController<S> {
    source: S,
    renderer: Renderer,
    view: DashboardView,
    options: ControllerOptions,
    book: Mutex<RefreshBook>,
    epoch: CountdownEpoch,
}

impl<S: SnapshotSource> DashboardController<S> {
    /// Create a controller. Nothing is fetched until [`refresh`] or
    /// [`run`] is called.
    ///
    /// [`refresh`]: Self::refresh
    /// [`run`]: Self::run
    pub fn new(
        source: S,
        renderer: Renderer,
        view: DashboardView,
        options: ControllerOptions,
    ) -> Self {
        Self {
            source,
            renderer,
            view,
            options,
            book: Mutex::new(RefreshBook::default()),
            epoch: Arc::new(Mutex::new(0)),
        }
    }

    /// The view this controller writes to.
    pub const fn view(&self) -> &DashboardView {
        &self.view
    }

    /// Whether a countdown task is currently ticking.
    pub async fn countdown_active(&self) -> bool {
        self.book
            .lock()
            .await
            .countdown
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    const fn labels(&self) -> &'static Labels {
        self.renderer.labels()
    }

    /// Run the refresh timer and the manual trigger loop.
    ///
    /// The first timer tick completes immediately, which is the eager
    /// startup refresh. The loop never ends on its own; closing the
    /// trigger channel only stops manual refreshes.
    pub async fn run(self: Arc<Self>, mut triggers: mpsc::Receiver<RefreshTrigger>) {
        let mut ticker = tokio::time::interval(self.options.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut next_tick_reason = RefreshReason::Startup;
        let mut triggers_open = true;

        info!(
            source = self.source.describe(),
            refresh_interval_secs = self.options.refresh_interval.as_secs(),
            countdown_interval_ms = self.options.countdown_interval.as_millis(),
            "dashboard controller started"
        );

        loop {
            let reason = tokio::select! {
                _ = ticker.tick() => {
                    Some(std::mem::replace(&mut next_tick_reason, RefreshReason::Timer))
                }
                trigger = triggers.recv(), if triggers_open => {
                    if trigger.is_none() {
                        triggers_open = false;
                        debug!("manual trigger channel closed");
                    }
                    trigger.map(|RefreshTrigger| RefreshReason::Manual)
                }
            };
            let Some(reason) = reason else {
                continue;
            };

            let controller = Arc::clone(&self);
            tokio::spawn(async move {
                let outcome = controller.refresh().await;
                debug!(?reason, ?outcome, "refresh finished");
            });
        }
    }

    /// Fetch once and replace the view with the result.
    ///
    /// The trigger shows the loading label while any refresh is in flight
    /// and returns to idle when the last one finishes, whatever the
    /// outcome.
    pub async fn refresh(&self) -> RefreshOutcome {
        let generation = {
            let mut book = self.book.lock().await;
            book.issued = book.issued.wrapping_add(1);
            book.in_flight = book.in_flight.saturating_add(1);
            self.view.set_trigger_label(self.labels().fetch_loading).await;
            book.issued
        };
        debug!(generation, source = self.source.describe(), "refresh started");

        let result = self.source.fetch().await;

        let mut book = self.book.lock().await;
        let outcome = if generation <= book.shown {
            debug!(generation, shown = book.shown, "dropping stale response");
            RefreshOutcome::Stale
        } else {
            book.shown = generation;
            self.present(result, &mut book).await
        };

        book.in_flight = book.in_flight.saturating_sub(1);
        if book.in_flight == 0 {
            self.view.set_trigger_label(self.labels().fetch_idle).await;
        }
        outcome
    }

    /// Show a fetch result. Called with the book locked.
    async fn present(
        &self,
        result: Result<DataResponse, DashboardError>,
        book: &mut RefreshBook,
    ) -> RefreshOutcome {
        let snapshot = match result {
            Ok(DataResponse::Snapshot(snapshot)) => snapshot,
            Ok(DataResponse::Failure(text)) => {
                warn!(error = %text, "server reported an error");
                self.view.show_result_text(text).await;
                return RefreshOutcome::ServerError;
            }
            Err(e) => {
                warn!(error = %e, source = self.source.describe(), "refresh request failed");
                self.view
                    .show_result_text(format!("{}: {e}", self.labels().fetch_failed))
                    .await;
                return RefreshOutcome::RequestFailed;
            }
        };

        let (summary, rows) = match self.render(&snapshot) {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!(error = %e, "failed to render snapshot");
                self.view
                    .show_result_text(format!("{}: {e}", self.labels().fetch_failed))
                    .await;
                return RefreshOutcome::RenderFailed;
            }
        };

        self.restart_countdown(snapshot.next_earthquake, book).await;
        self.view.show_result_html(summary).await;
        self.view.clear_cities().await;
        for row in rows {
            self.view.append_city_row(row).await;
        }

        info!(
            location = %snapshot.earthquake_location,
            magnitude = snapshot.earthquake_magnitude,
            cities = snapshot.closest_cities.len(),
            next_earthquake = ?snapshot.next_earthquake,
            "snapshot rendered"
        );
        RefreshOutcome::Rendered
    }

    /// Render the summary table and every city row, or nothing.
    fn render(
        &self,
        snapshot: &EarthquakeSnapshot,
    ) -> Result<(String, Vec<String>), DashboardError> {
        let summary = self.renderer.summary_table(snapshot)?;
        let rows = snapshot
            .closest_cities
            .iter()
            .map(|city| self.renderer.city_row(city))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((summary, rows))
    }

    /// Cancel the current countdown and start one for `target`.
    async fn restart_countdown(&self, target: Option<DateTime<Utc>>, book: &mut RefreshBook) {
        if let Some(previous) = book.countdown.take() {
            previous.abort();
        }
        let id = {
            let mut epoch = self.epoch.lock().await;
            *epoch = epoch.wrapping_add(1);
            *epoch
        };

        let Some(target) = target else {
            self.view
                .set_timer_text(self.labels().no_prediction.to_owned())
                .await;
            return;
        };

        let task = CountdownTask {
            view: self.view.clone(),
            labels: self.labels(),
            clock: self.options.clock,
            period: self.options.countdown_interval,
            epoch: Arc::clone(&self.epoch),
            id,
        };
        book.countdown = Some(tokio::spawn(task.run(target)).abort_handle());
    }
}

/// One countdown, bound to the epoch it was started in.
struct CountdownTask {
    view: DashboardView,
    labels: &'static Labels,
    clock: WallClock,
    period: Duration,
    epoch: CountdownEpoch,
    id: u64,
}

impl CountdownTask {
    /// Tick until the countdown expires, is aborted, or is replaced.
    ///
    /// The first label is shown immediately, then once per `period`.
    async fn run(self, target: DateTime<Utc>) {
        let mut countdown = Countdown::new();
        countdown.start(target);

        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let (text, done) = match countdown.tick(self.clock.now()) {
                Tick::Remaining(remaining) => (self.labels.countdown(&remaining), false),
                Tick::Expired => (self.labels.expired.to_owned(), true),
                Tick::Inactive => return,
            };

            let epoch = self.epoch.lock().await;
            if *epoch != self.id {
                debug!(id = self.id, current = *epoch, "countdown replaced, stopping");
                return;
            }
            self.view.set_timer_text(text).await;
            drop(epoch);

            if done {
                debug!(%target, "countdown expired");
                return;
            }
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{TimeDelta, TimeZone};
    use quakewatch_types::{CityCode, ClosestCity, Reading};

    use super::*;
    use crate::labels::EN;
    use crate::view::{ResultArea, ViewPatch};

    struct Scripted {
        delay: Duration,
        result: Result<DataResponse, DashboardError>,
    }

    impl Scripted {
        const fn now(result: Result<DataResponse, DashboardError>) -> Self {
            Self {
                delay: Duration::ZERO,
                result,
            }
        }

        const fn after(delay: Duration, result: Result<DataResponse, DashboardError>) -> Self {
            Self { delay, result }
        }
    }

    /// Replays scripted responses in order.
    struct ScriptedSource {
        script: std::sync::Mutex<VecDeque<Scripted>>,
        fetches: AtomicUsize,
    }

    impl SnapshotSource for ScriptedSource {
        async fn fetch(&self) -> Result<DataResponse, DashboardError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let next = self
                .script
                .lock()
                .ok()
                .and_then(|mut script| script.pop_front());
            let Some(next) = next else {
                return Err(DashboardError::Fetch("script exhausted".to_owned()));
            };
            if !next.delay.is_zero() {
                tokio::time::sleep(next.delay).await;
            }
            next.result
        }

        fn describe(&self) -> &str {
            "scripted"
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    fn city(name: &str, code: i64, distance: f64, population: u64) -> ClosestCity {
        ClosestCity {
            name: name.to_owned(),
            city_code: CityCode::Number(code),
            distance,
            population,
        }
    }

    fn snapshot(
        target: Option<DateTime<Utc>>,
        location: &str,
        cities: Vec<ClosestCity>,
    ) -> Result<DataResponse, DashboardError> {
        Ok(DataResponse::Snapshot(Box::new(EarthquakeSnapshot {
            average_magnitude: 2.0,
            next_earthquake: target,
            earthquake_depth: Reading::Number(10.0),
            earthquake_location: location.to_owned(),
            earthquake_magnitude: 3.5,
            recent_earthquake_count: 100,
            last_update: t0(),
            today_date: t0(),
            closest_cities: cities,
        })))
    }

    fn controller(script: Vec<Scripted>) -> DashboardController<ScriptedSource> {
        let source = ScriptedSource {
            script: std::sync::Mutex::new(script.into()),
            fetches: AtomicUsize::new(0),
        };
        let options = ControllerOptions {
            refresh_interval: Duration::from_secs(60),
            countdown_interval: Duration::from_secs(1),
            clock: WallClock::anchored_at(t0()),
        };
        let renderer = Renderer::new(&EN).unwrap();
        DashboardController::new(source, renderer, DashboardView::new(&EN), options)
    }

    /// Let spawned tasks run without moving the paused clock.
    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    async fn advance(secs: u64) {
        tokio::time::advance(Duration::from_secs(secs)).await;
        settle().await;
    }

    fn drain(rx: &mut tokio::sync::broadcast::Receiver<ViewPatch>) -> Vec<ViewPatch> {
        let mut patches = Vec::new();
        while let Ok(patch) = rx.try_recv() {
            patches.push(patch);
        }
        patches
    }

    fn timer_texts(patches: &[ViewPatch]) -> Vec<String> {
        patches
            .iter()
            .filter_map(|patch| match patch {
                ViewPatch::TimerText { text } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn valid_snapshot_renders_tables_and_starts_countdown() {
        let target = t0()
            + TimeDelta::days(1)
            + TimeDelta::hours(2)
            + TimeDelta::minutes(3)
            + TimeDelta::seconds(4);
        let cities = vec![city("A", 1, 12.345, 100), city("B", 2, 0.5, 50)];
        let c = controller(vec![Scripted::now(snapshot(Some(target), "AEGEAN SEA", cities))]);

        assert_eq!(c.refresh().await, RefreshOutcome::Rendered);
        settle().await;

        let state = c.view().snapshot().await;
        assert_eq!(state.trigger_label, "Fetch Data");
        let ResultArea::Html(html) = &state.result else {
            panic!("expected a rendered table, got {:?}", state.result);
        };
        assert!(html.contains("AEGEAN SEA"));
        assert_eq!(state.city_rows.len(), 2);
        assert!(state.city_rows[0].contains("<td>A</td>"));
        assert!(state.city_rows[0].contains("12.35 m"));
        assert!(state.city_rows[1].contains("<td>B</td>"));
        assert!(state.city_rows[1].contains("0.50 m"));
        assert_eq!(state.timer_text, "1 days 2 hours 3 minutes 4 seconds");
        assert!(c.countdown_active().await);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_ticks_down_then_expires_once() {
        let c = controller(vec![Scripted::now(snapshot(
            Some(t0() + TimeDelta::seconds(2)),
            "X",
            Vec::new(),
        ))]);
        c.refresh().await;
        settle().await;
        assert_eq!(c.view().snapshot().await.timer_text, "0 days 0 hours 0 minutes 2 seconds");

        advance(1).await;
        assert_eq!(c.view().snapshot().await.timer_text, "0 days 0 hours 0 minutes 1 seconds");

        advance(1).await;
        assert_eq!(c.view().snapshot().await.timer_text, EN.expired);
        assert!(!c.countdown_active().await);

        let mut rx = c.view().subscribe();
        advance(5).await;
        assert!(drain(&mut rx).is_empty(), "no updates after expiry");
        assert_eq!(c.view().snapshot().await.timer_text, EN.expired);
    }

    #[tokio::test(start_paused = true)]
    async fn second_refresh_replaces_the_countdown() {
        let c = controller(vec![
            Scripted::now(snapshot(Some(t0() + TimeDelta::seconds(10)), "first", Vec::new())),
            Scripted::now(snapshot(Some(t0() + TimeDelta::hours(1)), "second", Vec::new())),
        ]);
        c.refresh().await;
        settle().await;
        c.refresh().await;
        settle().await;

        let mut rx = c.view().subscribe();
        advance(1).await;

        let texts = timer_texts(&drain(&mut rx));
        assert_eq!(texts, vec!["0 days 0 hours 59 minutes 59 seconds".to_owned()]);
        assert!(c.countdown_active().await);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_countdown_never_writes() {
        let view = DashboardView::new(&EN);
        let epoch: CountdownEpoch = Arc::new(Mutex::new(2));
        let task = CountdownTask {
            view: view.clone(),
            labels: &EN,
            clock: WallClock::anchored_at(t0()),
            period: Duration::from_secs(1),
            epoch: Arc::clone(&epoch),
            id: 1,
        };

        let handle = tokio::spawn(task.run(t0() + TimeDelta::hours(1)));
        settle().await;

        assert!(handle.is_finished(), "a stale countdown stops on its first tick");
        assert!(view.snapshot().await.timer_text.is_empty());
    }

    #[test]
    fn options_from_config_read_the_system_clock() {
        let options = ControllerOptions::from_config(&TimerConfig::default());
        assert!(matches!(options.clock, WallClock::System));
        assert_eq!(options.refresh_interval, Duration::from_secs(60));
        assert_eq!(options.countdown_interval, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn server_error_leaves_tables_and_timer_alone() {
        let c = controller(vec![
            Scripted::now(snapshot(
                Some(t0() + TimeDelta::hours(1)),
                "Y",
                vec![city("A", 1, 1.0, 1)],
            )),
            Scripted::now(Ok(DataResponse::Failure("X".to_owned()))),
        ]);
        c.refresh().await;
        settle().await;
        let before = c.view().snapshot().await;

        assert_eq!(c.refresh().await, RefreshOutcome::ServerError);
        let after = c.view().snapshot().await;

        assert_eq!(after.result, ResultArea::Text("X".to_owned()));
        assert_eq!(after.city_rows, before.city_rows);
        assert_eq!(after.timer_text, before.timer_text);
        assert_eq!(after.trigger_label, "Fetch Data");
        assert!(c.countdown_active().await, "the countdown keeps running");
    }

    #[tokio::test(start_paused = true)]
    async fn request_failure_resets_trigger() {
        let c = controller(vec![Scripted::now(Err(DashboardError::Fetch(
            "connection refused".to_owned(),
        )))]);

        assert_eq!(c.refresh().await, RefreshOutcome::RequestFailed);

        let state = c.view().snapshot().await;
        assert_eq!(state.trigger_label, "Fetch Data");
        let ResultArea::Text(text) = &state.result else {
            panic!("expected failure text, got {:?}", state.result);
        };
        assert!(text.starts_with("Could not fetch data: "));
        assert!(text.contains("connection refused"));
        assert!(state.timer_text.is_empty());
        assert!(!c.countdown_active().await);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_response_is_dropped() {
        let c = controller(vec![
            Scripted::after(
                Duration::from_secs(5),
                snapshot(Some(t0() + TimeDelta::hours(1)), "slow and old", Vec::new()),
            ),
            Scripted::after(
                Duration::from_secs(1),
                snapshot(Some(t0() + TimeDelta::hours(2)), "fast and new", Vec::new()),
            ),
        ]);

        let (old, new) = tokio::join!(c.refresh(), c.refresh());
        assert_eq!(old, RefreshOutcome::Stale);
        assert_eq!(new, RefreshOutcome::Rendered);

        let state = c.view().snapshot().await;
        let ResultArea::Html(html) = &state.result else {
            panic!("expected a rendered table, got {:?}", state.result);
        };
        assert!(html.contains("fast and new"));
        assert!(!html.contains("slow and old"));
        assert_eq!(state.trigger_label, "Fetch Data");
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_shows_loading_while_in_flight() {
        let c = Arc::new(controller(vec![Scripted::after(
            Duration::from_secs(5),
            Ok(DataResponse::Failure("later".to_owned())),
        )]));

        let task = tokio::spawn({
            let c = Arc::clone(&c);
            async move { c.refresh().await }
        });
        settle().await;
        assert_eq!(c.view().snapshot().await.trigger_label, "Loading");

        advance(5).await;
        assert_eq!(task.await.ok(), Some(RefreshOutcome::ServerError));
        assert_eq!(c.view().snapshot().await.trigger_label, "Fetch Data");
    }

    #[tokio::test(start_paused = true)]
    async fn missing_prediction_stops_countdown() {
        let c = controller(vec![
            Scripted::now(snapshot(Some(t0() + TimeDelta::hours(1)), "a", Vec::new())),
            Scripted::now(snapshot(None, "b", Vec::new())),
        ]);
        c.refresh().await;
        settle().await;
        assert!(c.countdown_active().await);

        c.refresh().await;
        settle().await;
        assert!(!c.countdown_active().await);

        advance(3).await;
        assert_eq!(c.view().snapshot().await.timer_text, EN.no_prediction);
    }

    #[tokio::test(start_paused = true)]
    async fn new_snapshot_replaces_city_rows() {
        let c = controller(vec![
            Scripted::now(snapshot(None, "a", vec![city("A", 1, 1.0, 1), city("B", 2, 2.0, 2)])),
            Scripted::now(snapshot(None, "b", vec![city("C", 3, 3.0, 3)])),
        ]);
        c.refresh().await;
        c.refresh().await;

        let rows = c.view().snapshot().await.city_rows;
        assert_eq!(rows.len(), 1);
        assert!(rows[0].contains("<td>C</td>"));
        assert_eq!(c.source.fetches.load(Ordering::SeqCst), 2);
    }
}
