//! Bridge from host callbacks to the snapshot rebuild loop.
//!
//! The [`HostEventBridge`] lives at the boundary between the host's threads
//! and the async runtime. It records what kind of rebuild is needed and wakes
//! the rebuild task; it never touches the snapshot itself.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

use super::emitter::HostEventListener;
use super::HostEvent;
use crate::services::RebuildScope;

/// Coalescing rebuild request flag shared by the host and `StateSync`.
///
/// Any number of events between two rebuilds collapse into one pending
/// request; a structural event anywhere in that window upgrades the request
/// to a full re-enumeration.
///
/// # Thread Safety
///
/// `on_host_event` only touches atomics and a [`Notify`], so it is safe to
/// call from any host thread and never blocks.
#[derive(Default)]
pub struct HostEventBridge {
    notify: Notify,
    pending: AtomicBool,
    structural: AtomicBool,
}

impl HostEventBridge {
    /// Creates a bridge with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a rebuild request and wakes the rebuild task.
    pub fn request(&self, scope: RebuildScope) {
        if scope == RebuildScope::Structure {
            self.structural.store(true, Ordering::SeqCst);
        }
        self.pending.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Waits until a request has been made since the last wakeup.
    pub async fn notified(&self) {
        self.notify.notified().await;
    }

    /// Takes the pending request, if any, clearing it.
    ///
    /// Cleared *before* the caller rebuilds, so events racing with the
    /// rebuild raise a fresh request instead of being lost.
    pub fn take(&self) -> Option<RebuildScope> {
        if !self.pending.swap(false, Ordering::SeqCst) {
            return None;
        }
        Some(self.take_structural())
    }

    /// Consumes only the structural marker, leaving the pending flag alone.
    ///
    /// Used by rebuilds triggered outside the loop (command dispatch) so a
    /// set change reported meanwhile is folded into that rebuild.
    pub fn take_structural(&self) -> RebuildScope {
        if self.structural.swap(false, Ordering::SeqCst) {
            RebuildScope::Structure
        } else {
            RebuildScope::Flags
        }
    }
}

impl HostEventListener for HostEventBridge {
    fn on_host_event(&self, event: HostEvent) {
        log::trace!("[EventBridge] Host event: {:?}", event);
        let scope = if event.is_structural() {
            RebuildScope::Structure
        } else {
            RebuildScope::Flags
        };
        self.request(scope);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn nothing_pending_initially() {
        let bridge = HostEventBridge::new();
        assert_eq!(bridge.take(), None);
    }

    #[test]
    fn flag_events_coalesce_into_one_request() {
        let bridge = HostEventBridge::new();
        bridge.on_host_event(HostEvent::FrequencyStateChanged);
        bridge.on_host_event(HostEvent::TransmittingChanged);
        bridge.on_host_event(HostEvent::LineStateChanged);

        assert_eq!(bridge.take(), Some(RebuildScope::Flags));
        assert_eq!(bridge.take(), None);
    }

    #[test]
    fn structural_event_upgrades_pending_request() {
        let bridge = HostEventBridge::new();
        bridge.on_host_event(HostEvent::FrequencyStateChanged);
        bridge.on_host_event(HostEvent::FrequenciesChanged);
        bridge.on_host_event(HostEvent::ConnectionChanged);

        assert_eq!(bridge.take(), Some(RebuildScope::Structure));
        assert_eq!(bridge.take(), None);
    }

    #[test]
    fn take_structural_leaves_pending_flag() {
        let bridge = HostEventBridge::new();
        bridge.on_host_event(HostEvent::LinesChanged);

        assert_eq!(bridge.take_structural(), RebuildScope::Structure);
        assert_eq!(bridge.take(), Some(RebuildScope::Flags));
    }

    #[tokio::test]
    async fn event_from_another_thread_wakes_waiter() {
        let bridge = Arc::new(HostEventBridge::new());
        let host_side = Arc::clone(&bridge);

        std::thread::spawn(move || {
            host_side.on_host_event(HostEvent::PrimaryFrequencyChanged);
        });

        tokio::time::timeout(Duration::from_secs(2), bridge.notified())
            .await
            .expect("waiter should be woken");
        assert_eq!(bridge.take(), Some(RebuildScope::Flags));
    }

    #[tokio::test]
    async fn request_before_wait_is_not_lost() {
        let bridge = HostEventBridge::new();
        bridge.request(RebuildScope::Flags);

        tokio::time::timeout(Duration::from_millis(100), bridge.notified())
            .await
            .expect("stored permit should complete the wait");
    }
}
