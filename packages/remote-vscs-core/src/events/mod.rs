//! Host change notifications.
//!
//! This module provides:
//! - [`HostEvent`], the change kinds a host reports
//! - [`HostEventListener`] trait the host calls back into
//! - [`HostEventBridge`] which turns host events into rebuild requests for
//!   [`StateSync`](crate::services::StateSync)

mod bridge;
mod emitter;

pub use bridge::HostEventBridge;
pub use emitter::{HostEventListener, LoggingEventListener};

/// Change kinds reported by the host.
///
/// Only [`LinesChanged`](Self::LinesChanged) and
/// [`FrequenciesChanged`](Self::FrequenciesChanged) alter the *set* of
/// lines/frequencies; every other kind only changes flags on existing items
/// or panel-wide state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostEvent {
    /// Lines were added or removed.
    LinesChanged,
    /// A line's call state changed.
    LineStateChanged,
    /// Frequencies were added or removed.
    FrequenciesChanged,
    /// Receive/receiving/transmit flags or text messages changed on a frequency.
    FrequencyStateChanged,
    /// A frequency entered or left an error state.
    FrequencyErrorStateChanged,
    /// Push-to-talk state changed.
    TransmittingChanged,
    /// Network link, audio engine or ATC session state changed.
    ConnectionChanged,
    /// The primary frequency changed.
    PrimaryFrequencyChanged,
    /// Group / all-to-speaker / tones-to-speaker changed.
    PanelSettingsChanged,
}

impl HostEvent {
    /// Whether the event changes which lines/frequencies exist.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::LinesChanged | Self::FrequenciesChanged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_set_changes_are_structural() {
        assert!(HostEvent::LinesChanged.is_structural());
        assert!(HostEvent::FrequenciesChanged.is_structural());
        assert!(!HostEvent::FrequencyStateChanged.is_structural());
        assert!(!HostEvent::TransmittingChanged.is_structural());
        assert!(!HostEvent::PrimaryFrequencyChanged.is_structural());
    }
}
