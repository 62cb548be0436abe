// Panel wire protocol (JSON, tagged by "command")

use serde::{Deserialize, Serialize};

use super::{DerivedMetrics, DisplaySettings};

/// Host → panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum PanelMessage {
    /// Derived metrics flattened next to the command tag.
    UpdateData(DerivedMetrics),
    UpdateMonitoringState {
        enabled: bool,
        #[serde(rename = "isPaused")]
        is_paused: bool,
    },
    CurrentSettings {
        settings: DisplaySettings,
    },
    Focus,
}

/// Panel → host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum PanelRequest {
    ToggleMonitoring,
    GetCurrentSettings,
    SaveSettings { settings: DisplaySettings },
    RestoreDefaults,
}

/// Indicator client → host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum IndicatorCommand {
    TogglePause,
    Refresh,
    FocusPanel,
}
