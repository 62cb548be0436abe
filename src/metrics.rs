// Snapshot -> DerivedMetrics. Pure: same snapshot and matcher always give the same result.

use crate::format::{clamp_percent, format_bytes, format_uptime};
use crate::models::{DerivedMetrics, ProcessSample, Snapshot};

/// Throughput treated as 100% for network and disk bars.
pub const MAX_THROUGHPUT_BYTES_PER_SEC: f64 = 10.0 * 1024.0 * 1024.0;

const MIB: f64 = 1024.0 * 1024.0;

/// Name/command markers of the editor process family.
pub const DEFAULT_PROCESS_MARKERS: [&str; 3] = ["code", "electron", "vscode"];

/// Case-insensitive substring matcher selecting the monitored process group.
#[derive(Debug, Clone)]
pub struct ProcessMatcher {
    markers: Vec<String>,
}

impl Default for ProcessMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_PROCESS_MARKERS)
    }
}

impl ProcessMatcher {
    pub fn new<I, T>(markers: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(|m| m.as_ref().trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    pub fn matches(&self, process: &ProcessSample) -> bool {
        let name = process.name.to_lowercase();
        let command = process.command.to_lowercase();
        self.markers
            .iter()
            .any(|m| name.contains(m.as_str()) || command.contains(m.as_str()))
    }
}

/// Summed CPU and memory percentages of the matched processes and of all processes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroupUsage {
    pub matched_cpu: f64,
    pub matched_mem_percent: f64,
    pub total_cpu: f64,
}

pub fn group_usage(processes: &[ProcessSample], matcher: &ProcessMatcher) -> GroupUsage {
    processes.iter().fold(GroupUsage::default(), |mut acc, p| {
        let cpu = non_negative(p.cpu_percent);
        acc.total_cpu += cpu;
        if matcher.matches(p) {
            acc.matched_cpu += cpu;
            acc.matched_mem_percent += non_negative(p.mem_percent);
        }
        acc
    })
}

/// Active memory, or used minus buff/cache when the source has no active figure.
pub fn active_memory_bytes(snapshot: &Snapshot) -> u64 {
    let mem = &snapshot.memory;
    match mem.active_bytes.filter(|&a| a > 0) {
        Some(active) => active,
        None => mem.used_bytes.saturating_sub(mem.buff_cache_bytes),
    }
}

/// Group CPU as a share of all process CPU, 0..=100; 0 when nothing is using CPU.
pub fn group_cpu_percent(usage: &GroupUsage) -> u32 {
    if usage.total_cpu <= 0.0 {
        return 0;
    }
    (usage.matched_cpu / usage.total_cpu * 100.0).round().clamp(0.0, 100.0) as u32
}

pub fn derive_metrics(snapshot: &Snapshot, matcher: &ProcessMatcher) -> DerivedMetrics {
    let total = snapshot.memory.total_bytes;
    let active = active_memory_bytes(snapshot);
    let used = snapshot.memory.used_bytes;

    let memory_percent = ratio_percent(active as f64, total as f64).round() as u32;
    let used_memory_percent = ratio_percent(used as f64, total as f64);

    let usage = group_usage(&snapshot.processes, matcher);
    let group_memory_mb = (usage.matched_mem_percent / 100.0 * (total as f64 / MIB)).round() as u64;
    let group_memory_percent = ratio_percent(group_memory_mb as f64 * MIB, total as f64);

    let rx = snapshot.network_rx_bytes_per_sec();
    let tx = snapshot.network_tx_bytes_per_sec();
    let read = non_negative(snapshot.disk.read_bytes_per_sec);
    let write = non_negative(snapshot.disk.write_bytes_per_sec);

    DerivedMetrics {
        cpu_percent: non_negative(snapshot.cpu_load_percent).round() as u32,
        memory_percent,
        group_cpu_percent: group_cpu_percent(&usage),
        group_memory_mb,
        group_memory_percent,
        network_down_formatted: format_bytes(rx),
        network_up_formatted: format_bytes(tx),
        network_down_percent: throughput_percent(rx),
        network_up_percent: throughput_percent(tx),
        disk_read_bytes_per_sec: read,
        disk_write_bytes_per_sec: write,
        uptime_text: format_uptime(snapshot.uptime_secs),
        cpu_load: non_negative(snapshot.cpu_load_percent),
        used_memory_percent,
        total_memory_bytes: total,
        used_memory_bytes: used,
        active_memory_bytes: active,
        network_down_bytes_per_sec: rx,
        network_up_bytes_per_sec: tx,
        disk_read_formatted: format_bytes(read),
        disk_write_formatted: format_bytes(write),
        disk_read_percent: throughput_percent(read),
        disk_write_percent: throughput_percent(write),
    }
}

fn ratio_percent(part: f64, total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    part / total * 100.0
}

fn throughput_percent(bytes_per_sec: f64) -> f64 {
    clamp_percent(bytes_per_sec / MAX_THROUGHPUT_BYTES_PER_SEC * 100.0)
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { 0.0 }
}
