//! Listener abstraction the host calls back into.
//!
//! The host depends on the [`HostEventListener`] trait rather than on the
//! bridge's services, which keeps the subscription a plain callback
//! registration.

use super::HostEvent;

/// Receives host change notifications.
///
/// Called on threads owned by the host, possibly concurrently. Implementations
/// must return quickly: enqueue work, never perform it inline.
///
/// # Example
///
/// ```ignore
/// host.subscribe(Arc::new(LoggingEventListener));
/// ```
pub trait HostEventListener: Send + Sync {
    /// Handles one host event.
    fn on_host_event(&self, event: HostEvent);
}

/// Logging listener for debugging and development.
///
/// Logs all events at debug level. Useful for tracing event flow from a host.
pub struct LoggingEventListener;

impl HostEventListener for LoggingEventListener {
    fn on_host_event(&self, event: HostEvent) {
        tracing::debug!(?event, structural = event.is_structural(), "host_event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Test listener that counts events.
    struct CountingEventListener {
        structural: AtomicUsize,
        other: AtomicUsize,
    }

    impl CountingEventListener {
        fn new() -> Self {
            Self {
                structural: AtomicUsize::new(0),
                other: AtomicUsize::new(0),
            }
        }
    }

    impl HostEventListener for CountingEventListener {
        fn on_host_event(&self, event: HostEvent) {
            if event.is_structural() {
                self.structural.fetch_add(1, Ordering::SeqCst);
            } else {
                self.other.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn counting_listener_tracks_events() {
        let listener = Arc::new(CountingEventListener::new());
        let as_dyn: Arc<dyn HostEventListener> = listener.clone();

        as_dyn.on_host_event(HostEvent::FrequenciesChanged);
        as_dyn.on_host_event(HostEvent::FrequencyStateChanged);
        as_dyn.on_host_event(HostEvent::TransmittingChanged);

        assert_eq!(listener.structural.load(Ordering::SeqCst), 1);
        assert_eq!(listener.other.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn logging_listener_accepts_events() {
        LoggingEventListener.on_host_event(HostEvent::ConnectionChanged);
    }
}
