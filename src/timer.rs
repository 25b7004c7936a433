//! Keyed, cancellable timers
//!
//! Replaces ad hoc start/clear timer pairs with a keyed handle table:
//! scheduling a key that is already pending atomically replaces the previous
//! timer ("latest wins", never "both fire"), and cancellation revokes a
//! timer before its callback can reach a component.
//!
//! Every schedule gets a process-unique epoch. A firing task re-validates
//! its epoch against the table *after* taking the engine lock, so a timer
//! cancelled or replaced while it was in flight is discarded at the dispatch
//! boundary and never observes the component.

use crate::component::ComponentId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::trace;

/// The logical purpose of a timer on a component. One timer of each purpose
/// can be pending per component at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerPurpose {
    /// Long-press detection after a press edge.
    LongPress,
    /// "Recent press" window for double-press detection.
    PressWindow,
    /// "Recent release" window for double-release detection.
    ReleaseWindow,
    /// "Recently touched" debounce for analog input.
    InputDebounce,
}

/// Identity of a timer: the owning component plus its purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerKey {
    pub component: ComponentId,
    pub purpose: TimerPurpose,
}

struct TimerEntry {
    epoch: u64,
    handle: JoinHandle<()>,
}

/// Shared timer table. Cloning is cheap; clones share the table.
#[derive(Clone)]
pub struct TimerService {
    entries: Arc<Mutex<HashMap<TimerKey, TimerEntry>>>,
    next_epoch: Arc<AtomicU64>,
}

impl TimerService {
    pub(crate) fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            next_epoch: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Schedule `key` to fire after `duration`, replacing (and revoking) any
    /// pending timer with the same key.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn schedule(
        &self,
        engine: Weak<Mutex<crate::engine::EngineInner>>,
        key: TimerKey,
        duration: Duration,
    ) {
        let epoch = self.next_epoch.fetch_add(1, Ordering::Relaxed);
        let service = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            crate::engine::fire_timer(engine, &service, key, epoch);
        });

        let mut entries = self.entries.lock();
        if let Some(previous) = entries.insert(key, TimerEntry { epoch, handle }) {
            trace!(?key, "timer replaced");
            previous.handle.abort();
        }
    }

    /// Cancel a pending timer, if any.
    pub(crate) fn cancel(&self, key: TimerKey) {
        if let Some(entry) = self.entries.lock().remove(&key) {
            trace!(?key, "timer cancelled");
            entry.handle.abort();
        }
    }

    /// Cancel every pending timer owned by `component`.
    pub(crate) fn cancel_component(&self, component: ComponentId) {
        let mut entries = self.entries.lock();
        entries.retain(|key, entry| {
            if key.component == component {
                entry.handle.abort();
                false
            } else {
                true
            }
        });
    }

    /// Consume the entry for `key` if `epoch` is still current.
    ///
    /// Called by the firing path with the engine lock held; a false return
    /// means the timer was cancelled or replaced in flight and must not
    /// dispatch.
    pub(crate) fn take_if_current(&self, key: TimerKey, epoch: u64) -> bool {
        let mut entries = self.entries.lock();
        match entries.get(&key) {
            Some(entry) if entry.epoch == epoch => {
                entries.remove(&key);
                true
            }
            _ => false,
        }
    }

    /// Whether a timer is pending for `key`.
    pub(crate) fn is_pending(&self, key: TimerKey) -> bool {
        self.entries.lock().contains_key(&key)
    }
}
