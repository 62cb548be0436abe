// Domain models: raw snapshots, derived metrics, settings, wire messages

mod derived;
mod panel;
mod settings;
mod snapshot;

pub use derived::DerivedMetrics;
pub use panel::{IndicatorCommand, PanelMessage, PanelRequest};
pub use settings::{DisplaySettings, MIN_UPDATE_INTERVAL_MS, Visibility};
pub use snapshot::{DiskRate, InterfaceRate, MemorySample, ProcessSample, Snapshot};
