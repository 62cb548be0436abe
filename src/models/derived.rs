// Display-ready values computed from exactly one Snapshot

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    pub cpu_percent: u32,
    /// Active memory share; not clamped (some sources report active > total).
    pub memory_percent: u32,
    /// Process group's share of all process CPU, 0..=100.
    pub group_cpu_percent: u32,
    #[serde(rename = "groupMemoryMB")]
    pub group_memory_mb: u64,
    pub group_memory_percent: f64,
    pub network_down_formatted: String,
    pub network_up_formatted: String,
    pub network_down_percent: f64,
    pub network_up_percent: f64,
    pub disk_read_bytes_per_sec: f64,
    pub disk_write_bytes_per_sec: f64,
    pub uptime_text: String,

    // Panel detail
    pub cpu_load: f64,
    pub used_memory_percent: f64,
    pub total_memory_bytes: u64,
    pub used_memory_bytes: u64,
    pub active_memory_bytes: u64,
    pub network_down_bytes_per_sec: f64,
    pub network_up_bytes_per_sec: f64,
    pub disk_read_formatted: String,
    pub disk_write_formatted: String,
    pub disk_read_percent: f64,
    pub disk_write_percent: f64,
}
