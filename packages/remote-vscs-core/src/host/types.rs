//! Domain types exchanged with the host telephony/radio subsystem.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Host-assigned key for a line. Never leaves the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineHandle(pub u64);

impl fmt::Display for LineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line#{}", self.0)
    }
}

/// Host-assigned key for a frequency. Never leaves the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrequencyHandle(pub u64);

impl fmt::Display for FrequencyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "freq#{}", self.0)
    }
}

/// Kind of telephony line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineType {
    /// Direct-access line to another position.
    Direct,
    /// Ground line.
    Ground,
    /// Radio relay line.
    Radio,
    /// Intercom within the facility.
    Intercom,
    /// Hotline: rings immediately on selection.
    Hotline,
    /// Coldline: requires the far end to answer.
    Coldline,
}

impl LineType {
    /// Stable label, also used as the id discriminator.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "Direct",
            Self::Ground => "Ground",
            Self::Radio => "Radio",
            Self::Intercom => "Intercom",
            Self::Hotline => "Hotline",
            Self::Coldline => "Coldline",
        }
    }
}

impl fmt::Display for LineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Call state of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LineState {
    /// No call.
    #[default]
    Idle,
    /// Incoming call waiting to be answered.
    Ringing,
    /// Outgoing call waiting for the far end.
    Outgoing,
    /// Call in progress.
    Connected,
    /// Call on hold.
    Held,
}

/// Receive/transmit mode of a frequency.
///
/// The host only ever holds one of these three combinations; a frequency
/// never transmits without receiving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrequencyMode {
    /// R=0, T=0.
    Idle,
    /// R=1, T=0.
    Receiving,
    /// R=1, T=1.
    Transmitting,
}

impl FrequencyMode {
    /// Returns `(receive, transmit)`.
    #[must_use]
    pub fn flags(&self) -> (bool, bool) {
        match self {
            Self::Idle => (false, false),
            Self::Receiving => (true, false),
            Self::Transmitting => (true, true),
        }
    }
}

/// A line as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostLine {
    /// Host lookup key.
    pub handle: LineHandle,
    /// Line name (the far-end callsign).
    pub name: String,
    /// Line kind.
    pub line_type: LineType,
    /// Current call state.
    pub state: LineState,
    /// Short sector name, if the line is bound to a sector.
    pub sector_name: Option<String>,
    /// Full sector name, if the line is bound to a sector.
    pub sector_full_name: Option<String>,
    /// Whether the line leaves the facility.
    pub external: bool,
}

/// A frequency as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFrequency {
    /// Host lookup key.
    pub handle: FrequencyHandle,
    /// Frequency name (position callsign).
    pub name: String,
    /// Human-facing name.
    pub friendly_name: String,
    /// Frequency in Hz.
    pub hertz: u32,
    /// Alias frequency in Hz (0 when none).
    pub alias_hertz: u32,
    /// Text messages received on this frequency, oldest first.
    pub text_messages: Vec<String>,
    /// Receive enabled.
    pub receive: bool,
    /// Signal currently present.
    pub receiving: bool,
    /// Transmit enabled.
    pub transmit: bool,
}

/// Panel-wide flags reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PanelStatus {
    /// Linked to the network.
    pub network_connected: bool,
    /// Audio engine connected.
    pub audio_connected: bool,
    /// Push-to-talk active.
    pub transmitting: bool,
    /// Frequencies grouped.
    pub group: bool,
    /// All audio routed to the speaker.
    pub all_to_speaker: bool,
    /// Tones routed to the speaker.
    pub tones_to_speaker: bool,
}

impl PanelStatus {
    /// Network link and audio engine both up.
    #[must_use]
    pub fn connected(&self) -> bool {
        self.network_connected && self.audio_connected
    }
}
