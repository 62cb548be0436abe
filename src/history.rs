// Rolling per-metric history for sparkline tooltips

use std::collections::VecDeque;

use crate::models::DerivedMetrics;

/// Samples kept per metric.
pub const HISTORY_LENGTH: usize = 15;

const GLYPHS: [char; 9] = ['░', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Fixed-capacity FIFO of samples, oldest first.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    capacity: usize,
    values: VecDeque<f64>,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_LENGTH)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity + 1),
        }
    }

    pub fn push(&mut self, value: f64) {
        self.values.push_back(value);
        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    /// Renders one glyph per sample, scaled against `max_value`, left-padded with the
    /// empty glyph so the result is always `capacity` characters wide.
    pub fn render(&self, max_value: f64) -> String {
        let pad = self.capacity.saturating_sub(self.values.len());
        let mut out = String::with_capacity(self.capacity * 3);
        out.extend(std::iter::repeat_n(GLYPHS[0], pad));
        for v in &self.values {
            out.push(glyph_for(*v, max_value));
        }
        out
    }
}

fn glyph_for(value: f64, max_value: f64) -> char {
    let normalized = if max_value > 0.0 && value.is_finite() {
        (value / max_value).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let index = (normalized * (GLYPHS.len() - 1) as f64).floor() as usize;
    GLYPHS[index.min(GLYPHS.len() - 1)]
}

/// Metrics with a trend line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKey {
    Cpu,
    Memory,
    GroupCpu,
    GroupMemory,
    /// KB/s
    NetworkDown,
    /// KB/s
    NetworkUp,
    /// KB/s
    DiskRead,
    /// KB/s
    DiskWrite,
}

impl MetricKey {
    pub const ALL: [MetricKey; 8] = [
        MetricKey::Cpu,
        MetricKey::Memory,
        MetricKey::GroupCpu,
        MetricKey::GroupMemory,
        MetricKey::NetworkDown,
        MetricKey::NetworkUp,
        MetricKey::DiskRead,
        MetricKey::DiskWrite,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// One buffer per metric; owned by a single registration.
#[derive(Debug, Clone)]
pub struct HistorySet {
    buffers: [HistoryBuffer; MetricKey::ALL.len()],
}

impl Default for HistorySet {
    fn default() -> Self {
        Self::new()
    }
}

impl HistorySet {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_LENGTH)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffers: std::array::from_fn(|_| HistoryBuffer::with_capacity(capacity)),
        }
    }

    pub fn push(&mut self, key: MetricKey, value: f64) {
        self.buffers[key.index()].push(value);
    }

    pub fn get(&self, key: MetricKey) -> &HistoryBuffer {
        &self.buffers[key.index()]
    }

    pub fn render(&self, key: MetricKey, max_value: f64) -> String {
        self.get(key).render(max_value)
    }

    /// Appends one tick's values to every buffer.
    pub fn record(&mut self, metrics: &DerivedMetrics) {
        self.push(MetricKey::Cpu, metrics.cpu_percent as f64);
        self.push(MetricKey::Memory, metrics.memory_percent as f64);
        self.push(MetricKey::GroupCpu, metrics.group_cpu_percent as f64);
        self.push(MetricKey::GroupMemory, metrics.group_memory_mb as f64);
        self.push(MetricKey::NetworkDown, metrics.network_down_bytes_per_sec / 1024.0);
        self.push(MetricKey::NetworkUp, metrics.network_up_bytes_per_sec / 1024.0);
        self.push(MetricKey::DiskRead, metrics.disk_read_bytes_per_sec / 1024.0);
        self.push(MetricKey::DiskWrite, metrics.disk_write_bytes_per_sec / 1024.0);
    }
}
