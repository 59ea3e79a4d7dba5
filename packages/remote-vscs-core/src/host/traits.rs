//! Trait abstractions for the host telephony/radio subsystem.
//!
//! The bridge never owns line or frequency state; it reads it through
//! [`HostPanel`], changes it through [`HostControl`] and learns about changes
//! through [`HostEvents`]. Services depend on these traits rather than on a
//! concrete host, so tests and the standalone server can plug in
//! [`SimulatedHost`](super::SimulatedHost).

use std::sync::Arc;

use thiserror::Error;

use super::types::{FrequencyHandle, HostFrequency, HostLine, LineHandle, PanelStatus};
use crate::events::HostEventListener;

/// Errors returned by host mutators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The line handle no longer refers to a line.
    #[error("unknown line: {0}")]
    UnknownLine(String),

    /// The frequency handle no longer refers to an active frequency.
    #[error("unknown frequency: {0}")]
    UnknownFrequency(String),

    /// No frequency with this name is known to the host.
    #[error("unknown frequency name: {0}")]
    UnknownFrequencyName(String),

    /// The host refused the operation (e.g. transmit without a valid ATC session).
    #[error("not authorized: {0}")]
    NotAuthorized(String),
}

/// Result alias for host operations.
pub type HostResult<T> = Result<T, HostError>;

/// Read access to the host's panel state.
///
/// Implementations must be cheap to call and must not block on the caller
/// for longer than a lock acquisition.
pub trait HostPanel: Send + Sync {
    /// Returns the panel-wide flags.
    fn panel_status(&self) -> PanelStatus;

    /// Enumerates the current lines in display order.
    fn lines(&self) -> Vec<HostLine>;

    /// Looks up a single line.
    fn line(&self, handle: LineHandle) -> Option<HostLine>;

    /// Enumerates the active frequencies in display order.
    fn frequencies(&self) -> Vec<HostFrequency>;

    /// Looks up a single active frequency.
    fn frequency(&self, handle: FrequencyHandle) -> Option<HostFrequency>;

    /// The frequency selected for outgoing transmission context, if any.
    fn primary_frequency(&self) -> Option<FrequencyHandle>;

    /// Whether the host holds a valid ATC session (transmit authorization).
    fn is_valid_atc(&self) -> bool;
}

/// Mutating operations on the host.
///
/// Each call is one host mutation; the host fires the matching
/// [`HostEvent`](crate::events::HostEvent)s itself.
pub trait HostControl: Send + Sync {
    /// Groups or ungroups frequencies.
    fn set_group(&self, enabled: bool) -> HostResult<()>;

    /// Routes all audio to the speaker.
    fn set_all_to_speaker(&self, enabled: bool) -> HostResult<()>;

    /// Routes tones to the speaker.
    fn set_tones_to_speaker(&self, enabled: bool) -> HostResult<()>;

    /// Places a call on a line.
    fn call_line(&self, line: LineHandle) -> HostResult<()>;

    /// Answers a ringing line.
    fn answer_line(&self, line: LineHandle) -> HostResult<()>;

    /// Ends the call on a line.
    fn hang_up_line(&self, line: LineHandle) -> HostResult<()>;

    /// Adds a known frequency to the panel by name.
    ///
    /// `grouped` adds it into the monitored group (receive enabled).
    fn add_frequency(&self, name: &str, grouped: bool) -> HostResult<()>;

    /// Removes a frequency from the panel.
    fn remove_frequency(&self, frequency: FrequencyHandle) -> HostResult<()>;

    /// Sets the receive flag. Clearing it also clears transmit.
    fn set_frequency_receive(&self, frequency: FrequencyHandle, enabled: bool) -> HostResult<()>;

    /// Sets the transmit flag. Setting it also sets receive.
    fn set_frequency_transmit(&self, frequency: FrequencyHandle, enabled: bool)
        -> HostResult<()>;

    /// Selects (or clears, with `None`) the primary frequency.
    fn set_primary_frequency(&self, frequency: Option<FrequencyHandle>) -> HostResult<()>;
}

/// Change-notification registration.
pub trait HostEvents: Send + Sync {
    /// Registers a listener. Listeners are invoked on the host's own thread.
    fn subscribe(&self, listener: Arc<dyn HostEventListener>);
}

// ─────────────────────────────────────────────────────────────────────────────
// Combined Traits (for trait objects)
// ─────────────────────────────────────────────────────────────────────────────

/// Combined trait for everything the bridge needs from the host.
///
/// Used by `StateSync` and `CommandDispatcher` through `Arc<dyn VscsHost>`.
pub trait VscsHost: HostPanel + HostControl + HostEvents {}

/// Blanket implementation for any type implementing all three traits.
impl<T: HostPanel + HostControl + HostEvents> VscsHost for T {}
