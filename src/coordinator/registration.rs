// One consumer's subscription: own pause flag, own history, shared samples

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::history::HistorySet;
use crate::models::DerivedMetrics;
use crate::sinks::Sink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationId(pub u64);

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

pub(crate) struct Registration {
    pub(crate) id: RegistrationId,
    pub(crate) sink: Arc<dyn Sink>,
    /// Written only while `delivery` is held; read lock-free for target selection.
    paused: AtomicBool,
    delivery: Mutex<Delivery>,
}

struct Delivery {
    history: HistorySet,
    /// Sequence of the newest snapshot handed to the sink.
    last_seq: u64,
}

impl Registration {
    pub(crate) fn new(id: RegistrationId, sink: Arc<dyn Sink>, history_length: usize) -> Self {
        Self {
            id,
            sink,
            paused: AtomicBool::new(false),
            delivery: Mutex::new(Delivery {
                history: HistorySet::with_capacity(history_length),
                last_seq: 0,
            }),
        }
    }

    fn delivery(&self) -> MutexGuard<'_, Delivery> {
        self.delivery.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Flips the flag once any delivery in progress has finished, so nothing reaches the
    /// sink after the caller goes on to clear it.
    pub(crate) fn set_paused(&self, paused: bool) {
        let _delivery = self.delivery();
        self.paused.store(paused, Ordering::Release);
    }

    /// Records snapshot `seq` into this registration's history, then hands both to the sink.
    /// Returns false when paused or when a newer snapshot was already delivered.
    pub(crate) fn deliver(&self, seq: u64, metrics: &DerivedMetrics) -> bool {
        let mut delivery = self.delivery();
        if self.is_paused() || seq <= delivery.last_seq {
            return false;
        }
        delivery.last_seq = seq;
        delivery.history.record(metrics);
        self.sink.apply_derived(metrics, &delivery.history);
        true
    }

    pub(crate) fn history_len(&self) -> usize {
        self.delivery()
            .history
            .get(crate::history::MetricKey::Cpu)
            .len()
    }
}
