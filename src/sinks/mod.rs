// Consumer sinks: compact indicator sets and the visual panel binding

pub mod indicators;
pub mod panel;

use crate::history::HistorySet;
use crate::models::{DerivedMetrics, Visibility};

pub use indicators::{Indicator, IndicatorFrame, IndicatorSet};
pub use panel::{PanelBinding, PanelSlot};

/// What the coordinator may do to a consumer. Implementations must not block:
/// every call happens on the sampling path.
pub trait Sink: Send + Sync {
    /// New values for this tick, with the registration's own history for trend rendering.
    fn apply_derived(&self, metrics: &DerivedMetrics, history: &HistorySet);

    /// Per-category visibility from the current display settings.
    fn set_visible(&self, visibility: &Visibility);

    /// Reset to placeholders and hide (monitoring paused).
    fn clear(&self);

    /// Registration is gone; release outbound resources.
    fn dispose(&self);

    /// Pause state changed for this consumer.
    fn monitoring_state(&self, _paused: bool) {}
}
