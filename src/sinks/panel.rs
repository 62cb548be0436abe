// Visual panel binding: outbound PanelMessage queue, at most one bound panel

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;

use super::Sink;
use crate::coordinator::{Coordinator, RegistrationId};
use crate::history::HistorySet;
use crate::models::{DerivedMetrics, PanelMessage, Visibility};

/// Fire-and-forget writer into the panel's message queue.
pub struct PanelBinding {
    tx: Mutex<Option<mpsc::Sender<PanelMessage>>>,
}

impl PanelBinding {
    pub fn new(capacity: usize) -> (Arc<Self>, mpsc::Receiver<PanelMessage>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Arc::new(Self {
                tx: Mutex::new(Some(tx)),
            }),
            rx,
        )
    }

    /// Queues a message; dropped (and logged) when the panel is gone or not keeping up.
    pub fn send(&self, message: PanelMessage) {
        let guard = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = guard.as_ref() else {
            return;
        };
        if let Err(e) = tx.try_send(message) {
            match e {
                mpsc::error::TrySendError::Full(_) => {
                    tracing::warn!(operation = "panel_send", "panel queue full; message dropped")
                }
                mpsc::error::TrySendError::Closed(_) => {
                    tracing::debug!(operation = "panel_send", "panel queue closed")
                }
            }
        }
    }
}

impl Sink for PanelBinding {
    fn apply_derived(&self, metrics: &DerivedMetrics, _history: &HistorySet) {
        self.send(PanelMessage::UpdateData(metrics.clone()));
    }

    // The panel renders every category and reads its toggles from currentSettings.
    fn set_visible(&self, _visibility: &Visibility) {}

    fn clear(&self) {}

    fn dispose(&self) {
        // Dropping the sender ends the panel's receive loop.
        self.tx.lock().unwrap_or_else(PoisonError::into_inner).take();
    }

    fn monitoring_state(&self, paused: bool) {
        self.send(PanelMessage::UpdateMonitoringState {
            enabled: !paused,
            is_paused: paused,
        });
    }
}

/// Holds the single bound panel. Binding a new one releases the previous binding.
pub struct PanelSlot {
    coordinator: Coordinator,
    capacity: usize,
    current: Mutex<Option<(RegistrationId, Arc<PanelBinding>)>>,
}

impl PanelSlot {
    pub fn new(coordinator: Coordinator, capacity: usize) -> Self {
        Self {
            coordinator,
            capacity,
            current: Mutex::new(None),
        }
    }

    /// Registers a fresh panel binding, replacing (and unregistering) any bound panel.
    pub fn bind(&self) -> (RegistrationId, Arc<PanelBinding>, mpsc::Receiver<PanelMessage>) {
        let (binding, rx) = PanelBinding::new(self.capacity);
        let id = self.coordinator.register(binding.clone());
        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace((id, binding.clone()));
        if let Some((previous_id, _)) = previous {
            tracing::info!(previous = %previous_id, registration = %id, "panel replaced");
            self.coordinator.unregister(previous_id);
        }
        (id, binding, rx)
    }

    /// Unbinds `id` if it is still the bound panel; stale ids are ignored.
    pub fn release(&self, id: RegistrationId) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if current.as_ref().is_some_and(|(bound, _)| *bound == id) {
            current.take();
            drop(current);
            self.coordinator.unregister(id);
        }
    }

    pub fn bound(&self) -> Option<RegistrationId> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(id, _)| *id)
    }

    /// Asks the bound panel to take focus. Returns false when no panel is bound.
    pub fn focus(&self) -> bool {
        let binding = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(_, b)| b.clone());
        match binding {
            Some(b) => {
                b.send(PanelMessage::Focus);
                true
            }
            None => false,
        }
    }
}
