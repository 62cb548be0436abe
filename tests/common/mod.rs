// Shared test helpers

#![allow(dead_code)]

use futures_util::future::BoxFuture;
use hostmon::history::{HistorySet, MetricKey};
use hostmon::models::*;
use hostmon::sinks::Sink;
use hostmon::source::{MetricsSource, SourceError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn snapshot(cpu_load_percent: f64) -> Snapshot {
    Snapshot {
        cpu_load_percent,
        memory: MemorySample {
            total_bytes: 8 * 1024 * 1024 * 1024,
            used_bytes: 4 * 1024 * 1024 * 1024,
            active_bytes: Some(4 * 1024 * 1024 * 1024),
            buff_cache_bytes: 0,
        },
        processes: vec![
            ProcessSample {
                name: "code".into(),
                command: "/usr/share/code/code".into(),
                cpu_percent: 20.0,
                mem_percent: 5.0,
            },
            ProcessSample {
                name: "bash".into(),
                command: "/bin/bash".into(),
                cpu_percent: 20.0,
                mem_percent: 1.0,
            },
        ],
        network: vec![InterfaceRate {
            interface: "eth0".into(),
            rx_bytes_per_sec: 1024.0 * 1024.0,
            tx_bytes_per_sec: 512.0 * 1024.0,
        }],
        disk: DiskRate {
            read_bytes_per_sec: 2048.0,
            write_bytes_per_sec: 1024.0,
        },
        uptime_secs: 90_000,
    }
}

/// Scripted source: counts calls, optional latency, switchable failure.
pub struct FakeSource {
    calls: AtomicUsize,
    delay: Duration,
    fail: AtomicBool,
    cpu: Mutex<f64>,
}

impl FakeSource {
    pub fn new() -> Arc<Self> {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
            fail: AtomicBool::new(false),
            cpu: Mutex::new(46.0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_cpu(&self, cpu: f64) {
        *self.cpu.lock().unwrap() = cpu;
    }
}

impl MetricsSource for FakeSource {
    fn sample(&self) -> BoxFuture<'_, Result<Snapshot, SourceError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(SourceError::Unavailable("source offline".into()));
            }
            let cpu = *self.cpu.lock().unwrap();
            Ok(snapshot(cpu))
        })
    }
}

/// Sink that remembers everything it was told, optionally slow to apply or show.
#[derive(Default)]
pub struct RecordingSink {
    apply_delay: Duration,
    visible_delay: Duration,
    pub updates: Mutex<Vec<DerivedMetrics>>,
    pub cpu_history: Mutex<Vec<Vec<f64>>>,
    pub visibility: Mutex<Option<Visibility>>,
    pub clears: AtomicUsize,
    pub disposed: AtomicBool,
    pub paused_states: Mutex<Vec<bool>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Blocks the delivering thread for `delay` inside every `apply_derived`.
    pub fn slow_apply(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            apply_delay: delay,
            ..Default::default()
        })
    }

    /// Blocks the registering thread for `delay` inside `set_visible`.
    pub fn slow_visible(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            visible_delay: delay,
            ..Default::default()
        })
    }

    pub fn cpu_sequence(&self) -> Vec<u32> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.cpu_percent)
            .collect()
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<DerivedMetrics> {
        self.updates.lock().unwrap().last().cloned()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl Sink for RecordingSink {
    fn apply_derived(&self, metrics: &DerivedMetrics, history: &HistorySet) {
        if !self.apply_delay.is_zero() {
            std::thread::sleep(self.apply_delay);
        }
        self.updates.lock().unwrap().push(metrics.clone());
        self.cpu_history
            .lock()
            .unwrap()
            .push(history.get(MetricKey::Cpu).values().collect());
    }

    fn set_visible(&self, visibility: &Visibility) {
        if !self.visible_delay.is_zero() {
            std::thread::sleep(self.visible_delay);
        }
        *self.visibility.lock().unwrap() = Some(*visibility);
    }

    fn clear(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }

    fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }

    fn monitoring_state(&self, paused: bool) {
        self.paused_states.lock().unwrap().push(paused);
    }
}

/// Lets spawned tasks run without moving the clock.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Polls `cond` every 5 ms for up to 2 s.
pub async fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..400 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}
