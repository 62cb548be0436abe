// Raw sample models: one point-in-time bundle produced by a MetricsSource

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySample {
    pub total_bytes: u64,
    pub used_bytes: u64,
    /// "Active" memory when the platform reports it; derivation falls back to used - buff/cache.
    #[serde(default)]
    pub active_bytes: Option<u64>,
    #[serde(default)]
    pub buff_cache_bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSample {
    pub name: String,
    pub command: String,
    /// Share of one core (may exceed 100 on multi-core hosts).
    pub cpu_percent: f64,
    pub mem_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceRate {
    pub interface: String,
    pub rx_bytes_per_sec: f64,
    pub tx_bytes_per_sec: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskRate {
    pub read_bytes_per_sec: f64,
    pub write_bytes_per_sec: f64,
}

/// One collection cycle's worth of raw metrics. Shared read-only (behind `Arc`)
/// by every consumer served in that cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub cpu_load_percent: f64,
    pub memory: MemorySample,
    pub processes: Vec<ProcessSample>,
    pub network: Vec<InterfaceRate>,
    pub disk: DiskRate,
    pub uptime_secs: u64,
}

impl Snapshot {
    /// Sum of receive rates across all interfaces.
    pub fn network_rx_bytes_per_sec(&self) -> f64 {
        self.network.iter().map(|i| i.rx_bytes_per_sec.max(0.0)).sum()
    }

    /// Sum of transmit rates across all interfaces.
    pub fn network_tx_bytes_per_sec(&self) -> f64 {
        self.network.iter().map(|i| i.tx_bytes_per_sec.max(0.0)).sum()
    }
}
