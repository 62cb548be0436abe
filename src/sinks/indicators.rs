// Compact indicator set: seven short text indicators published as one frame per change

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::Sink;
use crate::format::{clamp_percent, format_bytes};
use crate::history::{HistorySet, MetricKey};
use crate::models::{DerivedMetrics, Visibility};

/// Clamped percentage at which cpu/memory indicators are flagged.
pub const HIGH_USAGE_PERCENT: f64 = 90.0;

const PERCENT_GRAPH_MAX: f64 = 100.0;
const GROUP_MEMORY_GRAPH_MAX_MB: f64 = 4000.0;
const THROUGHPUT_GRAPH_MAX_KB: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Indicator {
    pub text: String,
    pub tooltip: String,
    pub visible: bool,
    pub high_usage: bool,
}

impl Indicator {
    fn placeholder(text: &str, tooltip: &str) -> Self {
        Self {
            text: text.into(),
            tooltip: tooltip.into(),
            visible: false,
            high_usage: false,
        }
    }
}

/// Everything one indicator client displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorFrame {
    pub cpu: Indicator,
    pub memory: Indicator,
    pub group_cpu: Indicator,
    pub group_memory: Indicator,
    pub network: Indicator,
    pub disk: Indicator,
    pub uptime: Indicator,
    /// Set once the registration is gone; clients should close.
    pub disposed: bool,
}

impl Default for IndicatorFrame {
    fn default() -> Self {
        Self::placeholders()
    }
}

impl IndicatorFrame {
    /// Initial texts, all hidden.
    pub fn placeholders() -> Self {
        Self {
            cpu: Indicator::placeholder("0%", "System CPU Usage"),
            memory: Indicator::placeholder("0%", "System Memory Usage (Active)"),
            group_cpu: Indicator::placeholder("0%", "Process Group CPU Usage"),
            group_memory: Indicator::placeholder("0MB", "Process Group Memory Usage"),
            network: Indicator::placeholder("0↓0↑", "Network Usage (Down/Up)"),
            disk: Indicator::placeholder("0R/0W", "Disk Usage (Read/Write)"),
            uptime: Indicator::placeholder("--", "System Uptime"),
            disposed: false,
        }
    }

    fn indicators_mut(&mut self) -> [&mut Indicator; 7] {
        [
            &mut self.cpu,
            &mut self.memory,
            &mut self.group_cpu,
            &mut self.group_memory,
            &mut self.network,
            &mut self.disk,
            &mut self.uptime,
        ]
    }

    fn apply_visibility(&mut self, v: &Visibility) {
        self.cpu.visible = v.show_cpu;
        self.memory.visible = v.show_memory;
        self.group_cpu.visible = v.show_group_cpu;
        self.group_memory.visible = v.show_group_memory;
        self.network.visible = v.show_network;
        self.disk.visible = true;
        self.uptime.visible = true;
    }

    /// Rewrites texts and tooltips; visibility is left as it was.
    pub fn render(&mut self, m: &DerivedMetrics, history: &HistorySet) {
        set_content(
            &mut self.cpu,
            format!("{}%", m.cpu_percent),
            format!(
                "System CPU Usage: {}%\n{}",
                m.cpu_percent,
                history.render(MetricKey::Cpu, PERCENT_GRAPH_MAX)
            ),
            is_high_usage(m.cpu_percent as f64),
        );
        set_content(
            &mut self.memory,
            format!("{}%", m.memory_percent),
            format!(
                "System Memory Usage (Active): {}%\n{}",
                m.memory_percent,
                history.render(MetricKey::Memory, PERCENT_GRAPH_MAX)
            ),
            is_high_usage(m.memory_percent as f64),
        );
        set_content(
            &mut self.group_cpu,
            format!("{}%", m.group_cpu_percent),
            format!(
                "Process Group CPU Usage: {}% of all process CPU\n{}",
                m.group_cpu_percent,
                history.render(MetricKey::GroupCpu, PERCENT_GRAPH_MAX)
            ),
            is_high_usage(m.group_cpu_percent as f64),
        );
        set_content(
            &mut self.group_memory,
            format!("{}MB", m.group_memory_mb),
            format!(
                "Process Group Memory Usage: {}MB\n{}",
                m.group_memory_mb,
                history.render(MetricKey::GroupMemory, GROUP_MEMORY_GRAPH_MAX_MB)
            ),
            false,
        );
        set_content(
            &mut self.network,
            format!("{}↓{}↑", m.network_down_formatted, m.network_up_formatted),
            format!(
                "Network Usage\nDown: {}/s ↓{}\nUp: {}/s ↑{}",
                m.network_down_formatted,
                history.render(MetricKey::NetworkDown, THROUGHPUT_GRAPH_MAX_KB),
                m.network_up_formatted,
                history.render(MetricKey::NetworkUp, THROUGHPUT_GRAPH_MAX_KB)
            ),
            false,
        );
        let read = format_bytes(m.disk_read_bytes_per_sec);
        let write = format_bytes(m.disk_write_bytes_per_sec);
        set_content(
            &mut self.disk,
            format!("{}R/{}W", read, write),
            format!(
                "Disk Usage\nRead: {}/s R{}\nWrite: {}/s W{}",
                read,
                history.render(MetricKey::DiskRead, THROUGHPUT_GRAPH_MAX_KB),
                write,
                history.render(MetricKey::DiskWrite, THROUGHPUT_GRAPH_MAX_KB)
            ),
            false,
        );
        set_content(
            &mut self.uptime,
            m.uptime_text.clone(),
            format!("System Uptime: {}", m.uptime_text),
            false,
        );
    }
}

fn set_content(indicator: &mut Indicator, text: String, tooltip: String, high_usage: bool) {
    indicator.text = text;
    indicator.tooltip = tooltip;
    indicator.high_usage = high_usage;
}

/// Bar-style threshold check on the clamped value; the text keeps the raw number.
pub fn is_high_usage(percent: f64) -> bool {
    clamp_percent(percent) >= HIGH_USAGE_PERCENT
}

/// One consumer window's indicators. Publishes the latest frame on a watch channel,
/// so slow clients only ever see the newest state.
pub struct IndicatorSet {
    frame: Mutex<IndicatorFrame>,
    tx: watch::Sender<IndicatorFrame>,
}

impl IndicatorSet {
    pub fn new() -> (Arc<Self>, watch::Receiver<IndicatorFrame>) {
        let frame = IndicatorFrame::placeholders();
        let (tx, rx) = watch::channel(frame.clone());
        (
            Arc::new(Self {
                frame: Mutex::new(frame),
                tx,
            }),
            rx,
        )
    }

    /// Current frame (what the last publish sent).
    pub fn frame(&self) -> IndicatorFrame {
        self.frame
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update(&self, f: impl FnOnce(&mut IndicatorFrame)) {
        let mut frame = self.frame.lock().unwrap_or_else(PoisonError::into_inner);
        if frame.disposed {
            return;
        }
        f(&mut frame);
        // No receivers just means the client already went away.
        let _ = self.tx.send(frame.clone());
    }
}

impl Sink for IndicatorSet {
    fn apply_derived(&self, metrics: &DerivedMetrics, history: &HistorySet) {
        self.update(|frame| frame.render(metrics, history));
    }

    fn set_visible(&self, visibility: &Visibility) {
        self.update(|frame| frame.apply_visibility(visibility));
    }

    fn clear(&self) {
        self.update(|frame| *frame = IndicatorFrame::placeholders());
    }

    fn dispose(&self) {
        self.update(|frame| {
            for indicator in frame.indicators_mut() {
                indicator.visible = false;
            }
            frame.disposed = true;
        });
    }
}
