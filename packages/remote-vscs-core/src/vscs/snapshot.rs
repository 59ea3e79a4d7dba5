//! Full panel state as sent to clients.
//!
//! A [`Snapshot`] is immutable once built. `StateSync` replaces the current
//! one wholesale on every rebuild; nothing mutates a published snapshot.

use serde::{Deserialize, Serialize};

use super::ids::{frequency_id, line_id};
use crate::error::BridgeResult;
use crate::host::{
    FrequencyHandle, HostFrequency, HostLine, HostPanel, LineHandle, LineState, LineType,
};

/// One telephony line.
///
/// Equality ignores the host handle, which never crosses the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Line {
    #[serde(skip)]
    pub handle: Option<LineHandle>,
    pub id: u32,
    pub callsign: String,
    pub sector_name: Option<String>,
    pub sector_full_name: Option<String>,
    #[serde(rename = "type")]
    pub line_type: LineType,
    pub state: LineState,
    pub external: bool,
}

impl Line {
    fn from_host(line: HostLine) -> Self {
        Self {
            handle: Some(line.handle),
            id: line_id(&line.name, line.line_type),
            callsign: line.name,
            sector_name: line.sector_name,
            sector_full_name: line.sector_full_name,
            line_type: line.line_type,
            state: line.state,
            external: line.external,
        }
    }

    /// Same line with flags re-read from the host. The id is kept.
    fn refreshed(&self, line: HostLine) -> Self {
        Self {
            id: self.id,
            ..Self::from_host(line)
        }
    }
}

impl PartialEq for Line {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.callsign == other.callsign
            && self.sector_name == other.sector_name
            && self.sector_full_name == other.sector_full_name
            && self.line_type == other.line_type
            && self.state == other.state
            && self.external == other.external
    }
}

/// One radio frequency.
///
/// Equality ignores the host handle, which never crosses the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Frequency {
    #[serde(skip)]
    pub handle: Option<FrequencyHandle>,
    pub id: u32,
    pub name: String,
    pub friendly_name: String,
    pub hertz: u32,
    pub alias_hertz: u32,
    pub text_messages: Vec<String>,
    pub receive: bool,
    pub receiving: bool,
    pub transmit: bool,
    pub primary: bool,
}

impl Frequency {
    fn from_host(freq: HostFrequency, primary: Option<FrequencyHandle>) -> Self {
        Self {
            handle: Some(freq.handle),
            id: frequency_id(&freq.name, freq.hertz),
            primary: primary == Some(freq.handle),
            // A transmitting frequency always reads as receiving.
            receive: freq.receive || freq.transmit,
            name: freq.name,
            friendly_name: freq.friendly_name,
            hertz: freq.hertz,
            alias_hertz: freq.alias_hertz,
            text_messages: freq.text_messages,
            receiving: freq.receiving,
            transmit: freq.transmit,
        }
    }

    fn refreshed(&self, freq: HostFrequency, primary: Option<FrequencyHandle>) -> Self {
        Self {
            id: self.id,
            ..Self::from_host(freq, primary)
        }
    }
}

impl PartialEq for Frequency {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.friendly_name == other.friendly_name
            && self.hertz == other.hertz
            && self.alias_hertz == other.alias_hertz
            && self.text_messages == other.text_messages
            && self.receive == other.receive
            && self.receiving == other.receiving
            && self.transmit == other.transmit
            && self.primary == other.primary
    }
}

/// Complete VSCS panel state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Snapshot {
    /// Network link and audio engine both up.
    pub connected: bool,
    pub transmitting: bool,
    pub group: bool,
    pub all_to_speaker: bool,
    pub tones_to_speaker: bool,
    pub lines: Vec<Line>,
    pub frequencies: Vec<Frequency>,
}

impl Snapshot {
    /// Enumerates the host from scratch, recomputing every id.
    pub fn build<H: HostPanel + ?Sized>(host: &H) -> Self {
        let primary = host.primary_frequency();
        let lines = host.lines().into_iter().map(Line::from_host).collect();
        let frequencies = host
            .frequencies()
            .into_iter()
            .map(|f| Frequency::from_host(f, primary))
            .collect();
        Self::with_panel(host, lines, frequencies)
    }

    /// Keeps this snapshot's line and frequency lists and re-reads each
    /// item's flags through its handle.
    ///
    /// Returns `None` when an item has no handle or the host no longer knows
    /// it; the caller should fall back to [`Snapshot::build`].
    pub fn refresh<H: HostPanel + ?Sized>(&self, host: &H) -> Option<Self> {
        let primary = host.primary_frequency();
        let lines = self
            .lines
            .iter()
            .map(|line| line.handle.and_then(|h| host.line(h)).map(|l| line.refreshed(l)))
            .collect::<Option<Vec<_>>>()?;
        let frequencies = self
            .frequencies
            .iter()
            .map(|freq| {
                freq.handle
                    .and_then(|h| host.frequency(h))
                    .map(|f| freq.refreshed(f, primary))
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Self::with_panel(host, lines, frequencies))
    }

    fn with_panel<H: HostPanel + ?Sized>(
        host: &H,
        lines: Vec<Line>,
        frequencies: Vec<Frequency>,
    ) -> Self {
        let status = host.panel_status();
        Self {
            connected: status.connected(),
            transmitting: status.transmitting,
            group: status.group,
            all_to_speaker: status.all_to_speaker,
            tones_to_speaker: status.tones_to_speaker,
            lines,
            frequencies,
        }
    }

    /// Indented JSON with every field present.
    pub fn encode(&self) -> BridgeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses JSON produced by [`Snapshot::encode`]. Handles come back as `None`.
    pub fn decode(json: &str) -> BridgeResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn line_by_id(&self, id: u32) -> Option<&Line> {
        self.lines.iter().find(|l| l.id == id)
    }

    pub fn frequency_by_id(&self, id: u32) -> Option<&Frequency> {
        self.frequencies.iter().find(|f| f.id == id)
    }
}
