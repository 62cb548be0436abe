// MetricsSource over sysinfo

mod linux;

use crate::models::*;
use crate::source::{MetricsSource, SourceError};
use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use sysinfo::{Networks, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};
use tracing::instrument;

/// Samples the local host. Rates (network, disk) are computed against the previous call,
/// so the first sample reports them as zero.
pub struct SysinfoSource {
    probe: Arc<Mutex<Probe>>,
}

struct Probe {
    sys: System,
    networks: Networks,
    last_cpu_refresh: Option<(Instant, f64)>,
    last_network: Option<(HashMap<String, (u64, u64)>, Instant)>,
    last_process_refresh: Option<Instant>,
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoSource {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        let networks = Networks::new_with_refreshed_list();
        Self {
            probe: Arc::new(Mutex::new(Probe {
                sys,
                networks,
                last_cpu_refresh: None,
                last_network: None,
                last_process_refresh: None,
            })),
        }
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "collect"))]
    pub async fn collect(&self) -> Result<Snapshot, SourceError> {
        let probe = self.probe.clone();
        tokio::task::spawn_blocking(move || {
            let mut probe = probe
                .lock()
                .map_err(|e| SourceError::Unavailable(format!("sysinfo lock poisoned: {}", e)))?;
            Ok(probe.snapshot())
        })
        .await?
    }
}

impl MetricsSource for SysinfoSource {
    fn sample(&self) -> BoxFuture<'_, Result<Snapshot, SourceError>> {
        Box::pin(self.collect())
    }
}

impl Probe {
    fn snapshot(&mut self) -> Snapshot {
        let now = Instant::now();
        let cpu_load_percent = self.cpu_load(now);
        let memory = self.memory();
        let (processes, disk) = self.processes_and_disk(now, memory.total_bytes);
        let network = self.network_rates(now);
        Snapshot {
            cpu_load_percent,
            memory,
            processes,
            network,
            disk,
            uptime_secs: System::uptime(),
        }
    }

    fn cpu_load(&mut self, now: Instant) -> f64 {
        match self.last_cpu_refresh {
            Some((prev_ts, prev_usage))
                if now.duration_since(prev_ts) < sysinfo::MINIMUM_CPU_UPDATE_INTERVAL =>
            {
                // Too soon for a meaningful delta; reuse the last reading
                prev_usage
            }
            Some(_) => {
                self.sys.refresh_cpu_usage();
                let usage = (self.sys.global_cpu_usage() as f64).clamp(0.0, 100.0);
                self.last_cpu_refresh = Some((now, usage));
                usage
            }
            None => {
                // First call establishes the baseline
                self.sys.refresh_cpu_usage();
                self.last_cpu_refresh = Some((now, 0.0));
                0.0
            }
        }
    }

    fn memory(&mut self) -> MemorySample {
        self.sys.refresh_memory();
        let meminfo = linux::read_meminfo();
        MemorySample {
            total_bytes: self.sys.total_memory(),
            used_bytes: self.sys.used_memory(),
            active_bytes: meminfo.and_then(|m| m.active_bytes),
            buff_cache_bytes: meminfo.map(|m| m.buff_cache_bytes).unwrap_or(0),
        }
    }

    fn processes_and_disk(&mut self, now: Instant, total_memory: u64) -> (Vec<ProcessSample>, DiskRate) {
        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing()
                .with_cpu()
                .with_memory()
                .with_disk_usage()
                .with_cmd(UpdateKind::OnlyIfNotSet),
        );
        let elapsed_secs = self
            .last_process_refresh
            .map(|prev| now.duration_since(prev).as_secs_f64())
            .filter(|dt| *dt > 0.0);
        self.last_process_refresh = Some(now);

        let mut read_bytes: u64 = 0;
        let mut written_bytes: u64 = 0;
        let processes = self
            .sys
            .processes()
            .values()
            .map(|p| {
                let usage = p.disk_usage();
                read_bytes = read_bytes.saturating_add(usage.read_bytes);
                written_bytes = written_bytes.saturating_add(usage.written_bytes);
                let mem_percent = if total_memory > 0 {
                    p.memory() as f64 / total_memory as f64 * 100.0
                } else {
                    0.0
                };
                ProcessSample {
                    name: p.name().to_string_lossy().into_owned(),
                    command: p
                        .cmd()
                        .iter()
                        .map(|arg| arg.to_string_lossy())
                        .collect::<Vec<_>>()
                        .join(" "),
                    cpu_percent: p.cpu_usage() as f64,
                    mem_percent,
                }
            })
            .collect();

        let disk = match elapsed_secs {
            Some(dt) => DiskRate {
                read_bytes_per_sec: read_bytes as f64 / dt,
                write_bytes_per_sec: written_bytes as f64 / dt,
            },
            None => DiskRate::default(),
        };
        (processes, disk)
    }

    fn network_rates(&mut self, now: Instant) -> Vec<InterfaceRate> {
        self.networks.refresh(true);
        let totals: HashMap<String, (u64, u64)> = self
            .networks
            .list()
            .iter()
            .map(|(name, data)| {
                (
                    name.clone(),
                    (data.total_received(), data.total_transmitted()),
                )
            })
            .collect();

        let mut rates: Vec<InterfaceRate> = totals
            .keys()
            .map(|name| InterfaceRate {
                interface: name.clone(),
                rx_bytes_per_sec: 0.0,
                tx_bytes_per_sec: 0.0,
            })
            .collect();

        if let Some((ref prev, prev_ts)) = self.last_network {
            let dt_secs = now.duration_since(prev_ts).as_secs_f64();
            if dt_secs > 0.0 {
                for rate in &mut rates {
                    if let (Some((rx, tx)), Some((prev_rx, prev_tx))) =
                        (totals.get(&rate.interface), prev.get(&rate.interface))
                    {
                        rate.rx_bytes_per_sec = rx.saturating_sub(*prev_rx) as f64 / dt_secs;
                        rate.tx_bytes_per_sec = tx.saturating_sub(*prev_tx) as f64 / dt_secs;
                    }
                }
            }
        }
        rates.sort_by(|a, b| a.interface.cmp(&b.interface));
        self.last_network = Some((totals, now));
        rates
    }
}
