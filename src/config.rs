use crate::coordinator::DEFAULT_UPDATE_INTERVAL_MS;
use crate::metrics::DEFAULT_PROCESS_MARKERS;
use crate::models::MIN_UPDATE_INTERVAL_MS;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub settings: SettingsStoreConfig,
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub panel: PanelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettingsStoreConfig {
    pub path: String,
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: u32,
}

fn default_max_pool_size() -> u32 {
    2
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// Default sampling interval; saved display settings override it.
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,
    /// Serve the last snapshot to a new consumer instead of a blank first render.
    #[serde(default = "default_warm_start")]
    pub warm_start: bool,
    /// Case-insensitive name/command markers of the monitored process group.
    #[serde(default = "default_process_markers")]
    pub process_markers: Vec<String>,
    /// How often to log app stats (registrations, samples) at INFO level.
    #[serde(default = "default_stats_log_interval_secs")]
    pub stats_log_interval_secs: u64,
}

fn default_update_interval_ms() -> u64 {
    DEFAULT_UPDATE_INTERVAL_MS
}

fn default_warm_start() -> bool {
    true
}

fn default_stats_log_interval_secs() -> u64 {
    60
}

fn default_process_markers() -> Vec<String> {
    DEFAULT_PROCESS_MARKERS.iter().map(|m| m.to_string()).collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PanelConfig {
    /// Max queued messages for the panel (slow panels drop updates).
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize {
    32
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.settings.path.is_empty(),
            "settings.path must be non-empty"
        );
        anyhow::ensure!(
            self.settings.max_pool_size > 0,
            "settings.max_pool_size must be > 0, got {}",
            self.settings.max_pool_size
        );
        anyhow::ensure!(
            self.monitoring.update_interval_ms >= MIN_UPDATE_INTERVAL_MS,
            "monitoring.update_interval_ms must be >= {}, got {}",
            MIN_UPDATE_INTERVAL_MS,
            self.monitoring.update_interval_ms
        );
        anyhow::ensure!(
            self.monitoring
                .process_markers
                .iter()
                .any(|m| !m.trim().is_empty()),
            "monitoring.process_markers must contain at least one non-empty marker"
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        anyhow::ensure!(
            self.panel.channel_capacity > 0,
            "panel.channel_capacity must be > 0, got {}",
            self.panel.channel_capacity
        );
        Ok(())
    }
}
