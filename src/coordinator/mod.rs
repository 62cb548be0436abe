// Sampling/fan-out coordinator.
// One shared timer and at most one in-flight sample per process, fanned out to every
// active registration. Each registration keeps its own pause flag and history.

mod registration;

pub use registration::RegistrationId;
use registration::Registration;

use crate::history::HISTORY_LENGTH;
use crate::metrics::{ProcessMatcher, derive_metrics};
use crate::models::{DisplaySettings, Snapshot, Visibility};
use crate::sinks::Sink;
use crate::source::MetricsSource;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, interval_at};

/// Default sampling interval.
pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 4000;

/// Coordinator construction parameters.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub update_interval_ms: u64,
    /// Deliver the last collected snapshot to a new registration instead of waiting a tick.
    pub warm_start: bool,
    /// Sample right away for a new registration that got nothing from the cache.
    pub sample_on_register: bool,
    pub history_length: usize,
    pub matcher: ProcessMatcher,
    pub visibility: Visibility,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: DEFAULT_UPDATE_INTERVAL_MS,
            warm_start: true,
            sample_on_register: true,
            history_length: HISTORY_LENGTH,
            matcher: ProcessMatcher::default(),
            visibility: Visibility::default(),
        }
    }
}

/// Point-in-time view of the coordinator for /api/status and stats logging.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatorStatus {
    pub registrations: usize,
    pub active: usize,
    pub paused: usize,
    pub timer_running: bool,
    pub in_flight: bool,
    pub interval_ms: u64,
    pub has_cached_snapshot: bool,
    pub samples_total: u64,
    pub sample_failures_total: u64,
    pub skipped_ticks_total: u64,
}

/// Handle to the process-wide sampler. Cheap to clone; all clones share one state.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

struct Inner {
    source: Arc<dyn MetricsSource>,
    matcher: ProcessMatcher,
    warm_start: bool,
    sample_on_register: bool,
    history_length: usize,
    in_flight: AtomicBool,
    samples_total: AtomicU64,
    sample_failures_total: AtomicU64,
    skipped_ticks_total: AtomicU64,
    state: Mutex<State>,
}

struct State {
    registrations: BTreeMap<RegistrationId, Arc<Registration>>,
    next_id: u64,
    timer: Option<JoinHandle<()>>,
    interval: Duration,
    /// Last successful sample and its sequence number.
    last_snapshot: Option<(u64, Arc<Snapshot>)>,
    next_seq: u64,
    visibility: Visibility,
}

impl State {
    fn any_active(&self) -> bool {
        self.registrations.values().any(|r| !r.is_paused())
    }

    fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            tracing::debug!(operation = "stop_timer", "sampling timer stopped");
        }
    }
}

/// Holds the dedup gate; released on drop so every exit path clears it.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Coordinator {
    pub fn new(source: Arc<dyn MetricsSource>, config: CoordinatorConfig) -> Self {
        let CoordinatorConfig {
            update_interval_ms,
            warm_start,
            sample_on_register,
            history_length,
            matcher,
            visibility,
        } = config;
        Self {
            inner: Arc::new(Inner {
                source,
                matcher,
                warm_start,
                sample_on_register,
                history_length: history_length.max(1),
                in_flight: AtomicBool::new(false),
                samples_total: AtomicU64::new(0),
                sample_failures_total: AtomicU64::new(0),
                skipped_ticks_total: AtomicU64::new(0),
                state: Mutex::new(State {
                    registrations: BTreeMap::new(),
                    next_id: 1,
                    timer: None,
                    interval: interval_duration(update_interval_ms),
                    last_snapshot: None,
                    next_seq: 1,
                    visibility,
                }),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds an unpaused registration for `sink` and starts the shared timer if needed.
    /// The sink gets the cached snapshot when warm start is on, otherwise an immediate
    /// off-cycle sample. Registering a sink that is already registered returns its existing id.
    /// Must be called from within a Tokio runtime.
    pub fn register(&self, sink: Arc<dyn Sink>) -> RegistrationId {
        let (registration, warm, visibility, count) = {
            let mut state = self.state();
            if let Some(existing) = state
                .registrations
                .values()
                .find(|r| Arc::ptr_eq(&r.sink, &sink))
            {
                tracing::debug!(registration = %existing.id, "sink already registered");
                return existing.id;
            }

            let id = RegistrationId(state.next_id);
            state.next_id += 1;
            let registration = Arc::new(Registration::new(id, sink, self.inner.history_length));
            state.registrations.insert(id, registration.clone());
            self.start_timer(&mut state);

            let warm = if self.inner.warm_start {
                state.last_snapshot.clone()
            } else {
                None
            };
            (
                registration,
                warm,
                state.visibility,
                state.registrations.len(),
            )
        };

        registration.sink.set_visible(&visibility);
        match warm {
            // Dropped when a tick finishing meanwhile already delivered something newer.
            Some((seq, snapshot)) => {
                registration.deliver(seq, &derive_metrics(&snapshot, &self.inner.matcher));
            }
            None if self.inner.sample_on_register => {
                self.refresh_now();
            }
            None => {}
        }

        tracing::info!(
            registration = %registration.id,
            registrations = count,
            "consumer registered"
        );
        registration.id
    }

    /// Removes the registration and disposes its sink. Stops the timer and drops cached
    /// state when it was the last one. Unknown ids are ignored.
    pub fn unregister(&self, id: RegistrationId) {
        let (removed, remaining) = {
            let mut state = self.state();
            let removed = state.registrations.remove(&id);
            if state.registrations.is_empty() {
                state.stop_timer();
                state.last_snapshot = None;
            }
            (removed, state.registrations.len())
        };

        match removed {
            Some(registration) => {
                registration.sink.dispose();
                tracing::info!(
                    registration = %id,
                    registrations = remaining,
                    "consumer unregistered"
                );
            }
            None => tracing::debug!(registration = %id, "unregister: unknown registration"),
        }
    }

    /// Pauses or resumes one registration without touching the others.
    ///
    /// Pausing clears the sink; once nothing is active the timer stops. Resuming restores
    /// visibility, restarts the timer if needed and samples immediately.
    pub fn set_paused(&self, id: RegistrationId, paused: bool) {
        let (registration, visibility) = {
            let mut state = self.state();
            let Some(registration) = state.registrations.get(&id).cloned() else {
                tracing::debug!(registration = %id, "set_paused: unknown registration");
                return;
            };
            if registration.is_paused() == paused {
                return;
            }
            registration.set_paused(paused);

            if paused {
                if !state.any_active() {
                    state.stop_timer();
                    state.last_snapshot = None;
                }
            } else {
                self.start_timer(&mut state);
            }
            (registration, state.visibility)
        };

        registration.sink.monitoring_state(paused);
        if paused {
            registration.sink.clear();
            tracing::info!(registration = %id, "monitoring paused");
        } else {
            registration.sink.set_visible(&visibility);
            tracing::info!(registration = %id, "monitoring resumed");
            self.refresh_now();
        }
    }

    /// Flips the pause flag; returns the new state, or None for an unknown id.
    pub fn toggle_paused(&self, id: RegistrationId) -> Option<bool> {
        let paused = !self.is_paused(id)?;
        self.set_paused(id, paused);
        Some(paused)
    }

    pub fn is_paused(&self, id: RegistrationId) -> Option<bool> {
        self.state().registrations.get(&id).map(|r| r.is_paused())
    }

    /// Samples once, off-cycle, through the same dedup gate as the timer.
    /// Returns None when no registration is active.
    pub fn refresh_now(&self) -> Option<JoinHandle<()>> {
        if !self.state().any_active() {
            return None;
        }
        let this = self.clone();
        Some(tokio::spawn(async move { this.tick().await }))
    }

    /// Replaces the running timer (if any) with one at the new interval.
    pub fn set_interval(&self, update_interval_ms: u64) {
        let mut state = self.state();
        let interval = interval_duration(update_interval_ms);
        if state.interval == interval {
            return;
        }
        state.interval = interval;
        if state.timer.is_some() {
            state.stop_timer();
            self.start_timer(&mut state);
        }
        tracing::info!(interval_ms = update_interval_ms, "update interval changed");
    }

    /// Stores the visibility and pushes it to every unpaused sink.
    pub fn set_visibility(&self, visibility: Visibility) {
        let targets: Vec<Arc<Registration>> = {
            let mut state = self.state();
            state.visibility = visibility;
            state
                .registrations
                .values()
                .filter(|r| !r.is_paused())
                .cloned()
                .collect()
        };
        for registration in targets {
            registration.sink.set_visible(&visibility);
        }
    }

    pub fn apply_settings(&self, settings: &DisplaySettings) {
        self.set_visibility(settings.visibility);
        self.set_interval(settings.update_interval);
    }

    /// One collection cycle; the shared timer's body.
    ///
    /// Skipped when a cycle is already in flight or nobody is listening. Source failures
    /// are logged and leave every sink showing its previous values.
    pub async fn tick(&self) {
        if !self.state().any_active() {
            return;
        }
        let Some(_gate) = InFlightGuard::acquire(&self.inner.in_flight) else {
            self.inner.skipped_ticks_total.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(operation = "tick", "collection already in flight; tick skipped");
            return;
        };

        let snapshot = match self.inner.source.sample().await {
            Ok(s) => Arc::new(s),
            Err(e) => {
                self.inner
                    .sample_failures_total
                    .fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    error = %e,
                    operation = "sample",
                    "metrics sample failed; keeping previous values"
                );
                return;
            }
        };
        self.inner.samples_total.fetch_add(1, Ordering::Relaxed);

        let metrics = derive_metrics(&snapshot, &self.inner.matcher);

        // Targets are fixed after sampling: registrations removed while sampling miss this tick.
        let (seq, targets): (u64, Vec<Arc<Registration>>) = {
            let mut state = self.state();
            if !state.any_active() {
                return;
            }
            let seq = state.next_seq;
            state.next_seq += 1;
            state.last_snapshot = Some((seq, snapshot));
            let targets = state
                .registrations
                .values()
                .filter(|r| !r.is_paused())
                .cloned()
                .collect();
            (seq, targets)
        };

        let delivered = targets
            .iter()
            .filter(|registration| registration.deliver(seq, &metrics))
            .count();
        tracing::debug!(
            operation = "tick",
            seq,
            delivered,
            cpu_percent = metrics.cpu_percent,
            memory_percent = metrics.memory_percent,
            "sample delivered"
        );
    }

    /// Stops the timer, disposes every sink and clears cached state.
    pub fn shutdown(&self) {
        let registrations = {
            let mut state = self.state();
            state.stop_timer();
            state.last_snapshot = None;
            std::mem::take(&mut state.registrations)
        };
        for registration in registrations.values() {
            registration.sink.dispose();
        }
        tracing::info!(
            disposed = registrations.len(),
            "coordinator shut down"
        );
    }

    pub fn status(&self) -> CoordinatorStatus {
        let state = self.state();
        let paused = state
            .registrations
            .values()
            .filter(|r| r.is_paused())
            .count();
        CoordinatorStatus {
            registrations: state.registrations.len(),
            active: state.registrations.len() - paused,
            paused,
            timer_running: state.timer.is_some(),
            in_flight: self.inner.in_flight.load(Ordering::Acquire),
            interval_ms: state.interval.as_millis() as u64,
            has_cached_snapshot: state.last_snapshot.is_some(),
            samples_total: self.inner.samples_total.load(Ordering::Relaxed),
            sample_failures_total: self.inner.sample_failures_total.load(Ordering::Relaxed),
            skipped_ticks_total: self.inner.skipped_ticks_total.load(Ordering::Relaxed),
        }
    }

    /// Number of samples held in a registration's history (same for every metric).
    pub fn history_len(&self, id: RegistrationId) -> Option<usize> {
        let registration = self.state().registrations.get(&id).cloned()?;
        Some(registration.history_len())
    }

    /// Starts the shared timer when at least one registration is active and none is running.
    fn start_timer(&self, state: &mut State) {
        if state.timer.is_some() || !state.any_active() {
            return;
        }
        let period = state.interval;
        let first = Instant::now() + period;
        state.timer = Some(tokio::spawn(run_timer(
            Arc::downgrade(&self.inner),
            first,
            period,
        )));
        tracing::debug!(
            operation = "start_timer",
            interval_ms = period.as_millis() as u64,
            "sampling timer started"
        );
    }
}

/// Fires at `first` and every `period` after, spawning a tick each time so a slow sample
/// never delays the clock. Exits once the coordinator is gone.
async fn run_timer(inner: Weak<Inner>, first: Instant, period: Duration) {
    let mut tick = interval_at(first, period);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tick.tick().await;
        let Some(inner) = inner.upgrade() else {
            break;
        };
        let coordinator = Coordinator { inner };
        tokio::spawn(async move { coordinator.tick().await });
    }
}

fn interval_duration(update_interval_ms: u64) -> Duration {
    Duration::from_millis(update_interval_ms.max(1))
}
