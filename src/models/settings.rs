// User-adjustable display settings (persisted by SettingsRepo)

use serde::{Deserialize, Serialize};

/// Lowest update interval accepted from config or the panel.
pub const MIN_UPDATE_INTERVAL_MS: u64 = 500;

/// Per-category visibility. Disk and uptime indicators have no toggle and are always shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visibility {
    pub show_cpu: bool,
    pub show_memory: bool,
    pub show_group_cpu: bool,
    pub show_group_memory: bool,
    pub show_network: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            show_cpu: true,
            show_memory: true,
            show_group_cpu: true,
            show_group_memory: true,
            show_network: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySettings {
    #[serde(flatten)]
    pub visibility: Visibility,
    /// Sampling interval in milliseconds.
    pub update_interval: u64,
}

impl DisplaySettings {
    /// All categories visible, interval from config.
    pub fn defaults(update_interval_ms: u64) -> Self {
        Self {
            visibility: Visibility::default(),
            update_interval: update_interval_ms,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.update_interval >= MIN_UPDATE_INTERVAL_MS,
            "updateInterval must be >= {} ms, got {}",
            MIN_UPDATE_INTERVAL_MS,
            self.update_interval
        );
        Ok(())
    }
}
