//! In-memory host implementation.
//!
//! [`SimulatedHost`] stands in for the real telephony/radio subsystem in the
//! standalone server and in tests. It keeps the same contract a real host
//! has: every mutation updates state and then fires the matching
//! [`HostEvent`]s synchronously on the caller's thread.

use std::sync::Arc;

use parking_lot::RwLock;

use super::traits::{HostControl, HostError, HostEvents, HostPanel, HostResult};
use super::types::{
    FrequencyHandle, HostFrequency, HostLine, LineHandle, LineState, LineType, PanelStatus,
};
use crate::events::{HostEvent, HostEventListener};

/// A frequency the host knows about but that is not necessarily on the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogueFrequency {
    /// Frequency name, used by `AddFreq`.
    pub name: String,
    /// Human-facing name.
    pub friendly_name: String,
    /// Frequency in Hz.
    pub hertz: u32,
    /// Alias frequency in Hz.
    pub alias_hertz: u32,
}

impl CatalogueFrequency {
    /// Convenience constructor with no alias.
    pub fn new(name: &str, friendly_name: &str, hertz: u32) -> Self {
        Self {
            name: name.to_string(),
            friendly_name: friendly_name.to_string(),
            hertz,
            alias_hertz: 0,
        }
    }
}

#[derive(Default)]
struct SimState {
    status: PanelStatus,
    valid_atc: bool,
    lines: Vec<HostLine>,
    frequencies: Vec<HostFrequency>,
    catalogue: Vec<CatalogueFrequency>,
    primary: Option<FrequencyHandle>,
    next_handle: u64,
}

impl SimState {
    fn allocate(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn line_mut(&mut self, handle: LineHandle) -> HostResult<&mut HostLine> {
        self.lines
            .iter_mut()
            .find(|l| l.handle == handle)
            .ok_or_else(|| HostError::UnknownLine(handle.to_string()))
    }

    fn frequency_mut(&mut self, handle: FrequencyHandle) -> HostResult<&mut HostFrequency> {
        self.frequencies
            .iter_mut()
            .find(|f| f.handle == handle)
            .ok_or_else(|| HostError::UnknownFrequency(handle.to_string()))
    }
}

/// Thread-safe in-memory VSCS panel.
///
/// # Concurrency design
///
/// State sits behind one `RwLock`. Listeners are invoked after the lock is
/// released, so a listener may read the host re-entrantly.
#[derive(Default)]
pub struct SimulatedHost {
    state: RwLock<SimState>,
    listeners: RwLock<Vec<Arc<dyn HostEventListener>>>,
}

impl SimulatedHost {
    /// Creates an empty, disconnected panel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a connected panel with a handful of lines and frequencies.
    ///
    /// Used by the standalone server so a browser has something to show.
    pub fn demo_panel() -> Self {
        let host = Self::new();
        {
            let mut state = host.state.write();
            state.status = PanelStatus {
                network_connected: true,
                audio_connected: true,
                ..Default::default()
            };
            state.valid_atc = true;
            state.catalogue = vec![
                CatalogueFrequency::new("ML_TWR", "Melbourne Tower", 120_500_000),
                CatalogueFrequency::new("ML_GND", "Melbourne Ground", 121_700_000),
                CatalogueFrequency::new("ML_APP", "Melbourne Approach", 132_000_000),
                CatalogueFrequency::new("ML_DEL", "Melbourne Delivery", 127_200_000),
                CatalogueFrequency::new("BIK_CTR", "Melbourne Centre", 123_950_000),
            ];
        }
        host.add_line(
            "ML_GND",
            LineType::Direct,
            Some(("SMC", "Melbourne Ground")),
            false,
        );
        host.add_line(
            "ML_APP",
            LineType::Hotline,
            Some(("APP", "Melbourne Approach")),
            false,
        );
        host.add_line(
            "BN_CTR",
            LineType::Coldline,
            Some(("BN", "Brisbane Centre")),
            true,
        );
        for name in ["ML_TWR", "ML_GND", "ML_APP"] {
            if let Err(e) = host.add_frequency(name, false) {
                log::warn!("[SimHost] Demo frequency {} not added: {}", name, e);
            }
        }
        host
    }

    fn fire(&self, events: &[HostEvent]) {
        if events.is_empty() {
            return;
        }
        let listeners = self.listeners.read().clone();
        for event in events {
            for listener in &listeners {
                listener.on_host_event(*event);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Simulation hooks (what the real host would do on its own)
    // ─────────────────────────────────────────────────────────────────────

    /// Adds a line and returns its handle.
    pub fn add_line(
        &self,
        name: &str,
        line_type: LineType,
        sector: Option<(&str, &str)>,
        external: bool,
    ) -> LineHandle {
        let handle = {
            let mut state = self.state.write();
            let handle = LineHandle(state.allocate());
            state.lines.push(HostLine {
                handle,
                name: name.to_string(),
                line_type,
                state: LineState::Idle,
                sector_name: sector.map(|(short, _)| short.to_string()),
                sector_full_name: sector.map(|(_, full)| full.to_string()),
                external,
            });
            handle
        };
        self.fire(&[HostEvent::LinesChanged]);
        handle
    }

    /// Removes a line.
    pub fn remove_line(&self, handle: LineHandle) -> HostResult<()> {
        {
            let mut state = self.state.write();
            let before = state.lines.len();
            state.lines.retain(|l| l.handle != handle);
            if state.lines.len() == before {
                return Err(HostError::UnknownLine(handle.to_string()));
            }
        }
        self.fire(&[HostEvent::LinesChanged]);
        Ok(())
    }

    /// Simulates an incoming call.
    pub fn ring_line(&self, handle: LineHandle) -> HostResult<()> {
        self.state.write().line_mut(handle)?.state = LineState::Ringing;
        self.fire(&[HostEvent::LineStateChanged]);
        Ok(())
    }

    /// Adds a frequency to the catalogue of `AddFreq` targets.
    pub fn add_catalogue_frequency(&self, frequency: CatalogueFrequency) {
        self.state.write().catalogue.push(frequency);
    }

    /// Simulates the network link going up or down.
    pub fn set_network_connected(&self, connected: bool) {
        self.state.write().status.network_connected = connected;
        self.fire(&[HostEvent::ConnectionChanged]);
    }

    /// Simulates the audio engine connecting or dropping.
    pub fn set_audio_connected(&self, connected: bool) {
        self.state.write().status.audio_connected = connected;
        self.fire(&[HostEvent::ConnectionChanged]);
    }

    /// Grants or revokes transmit authorization.
    ///
    /// Revoking drops transmit on every frequency.
    pub fn set_valid_atc(&self, valid: bool) {
        let mut events = vec![HostEvent::ConnectionChanged];
        {
            let mut state = self.state.write();
            state.valid_atc = valid;
            if !valid && state.frequencies.iter().any(|f| f.transmit) {
                for f in state.frequencies.iter_mut() {
                    f.transmit = false;
                }
                events.push(HostEvent::FrequencyStateChanged);
            }
        }
        self.fire(&events);
    }

    /// Simulates push-to-talk.
    pub fn set_transmitting(&self, transmitting: bool) {
        self.state.write().status.transmitting = transmitting;
        self.fire(&[HostEvent::TransmittingChanged]);
    }

    /// Simulates signal presence on a frequency.
    pub fn set_receiving(&self, handle: FrequencyHandle, receiving: bool) -> HostResult<()> {
        self.state.write().frequency_mut(handle)?.receiving = receiving;
        self.fire(&[HostEvent::FrequencyStateChanged]);
        Ok(())
    }

    /// Appends a text message to a frequency.
    pub fn push_text_message(&self, handle: FrequencyHandle, message: &str) -> HostResult<()> {
        self.state
            .write()
            .frequency_mut(handle)?
            .text_messages
            .push(message.to_string());
        self.fire(&[HostEvent::FrequencyStateChanged]);
        Ok(())
    }

    /// Finds an active frequency by name.
    pub fn frequency_handle(&self, name: &str) -> Option<FrequencyHandle> {
        self.state
            .read()
            .frequencies
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| f.handle)
    }

    /// Finds a line by name.
    pub fn line_handle(&self, name: &str) -> Option<LineHandle> {
        self.state
            .read()
            .lines
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.handle)
    }
}

impl HostPanel for SimulatedHost {
    fn panel_status(&self) -> PanelStatus {
        self.state.read().status
    }

    fn lines(&self) -> Vec<HostLine> {
        self.state.read().lines.clone()
    }

    fn line(&self, handle: LineHandle) -> Option<HostLine> {
        self.state
            .read()
            .lines
            .iter()
            .find(|l| l.handle == handle)
            .cloned()
    }

    fn frequencies(&self) -> Vec<HostFrequency> {
        self.state.read().frequencies.clone()
    }

    fn frequency(&self, handle: FrequencyHandle) -> Option<HostFrequency> {
        self.state
            .read()
            .frequencies
            .iter()
            .find(|f| f.handle == handle)
            .cloned()
    }

    fn primary_frequency(&self) -> Option<FrequencyHandle> {
        self.state.read().primary
    }

    fn is_valid_atc(&self) -> bool {
        self.state.read().valid_atc
    }
}

impl HostControl for SimulatedHost {
    fn set_group(&self, enabled: bool) -> HostResult<()> {
        self.state.write().status.group = enabled;
        self.fire(&[HostEvent::PanelSettingsChanged]);
        Ok(())
    }

    fn set_all_to_speaker(&self, enabled: bool) -> HostResult<()> {
        self.state.write().status.all_to_speaker = enabled;
        self.fire(&[HostEvent::PanelSettingsChanged]);
        Ok(())
    }

    fn set_tones_to_speaker(&self, enabled: bool) -> HostResult<()> {
        self.state.write().status.tones_to_speaker = enabled;
        self.fire(&[HostEvent::PanelSettingsChanged]);
        Ok(())
    }

    fn call_line(&self, line: LineHandle) -> HostResult<()> {
        {
            let mut state = self.state.write();
            let line = state.line_mut(line)?;
            if line.state == LineState::Idle {
                line.state = match line.line_type {
                    LineType::Hotline | LineType::Intercom => LineState::Connected,
                    _ => LineState::Outgoing,
                };
            }
        }
        self.fire(&[HostEvent::LineStateChanged]);
        Ok(())
    }

    fn answer_line(&self, line: LineHandle) -> HostResult<()> {
        {
            let mut state = self.state.write();
            let line = state.line_mut(line)?;
            if matches!(line.state, LineState::Ringing | LineState::Held) {
                line.state = LineState::Connected;
            }
        }
        self.fire(&[HostEvent::LineStateChanged]);
        Ok(())
    }

    fn hang_up_line(&self, line: LineHandle) -> HostResult<()> {
        self.state.write().line_mut(line)?.state = LineState::Idle;
        self.fire(&[HostEvent::LineStateChanged]);
        Ok(())
    }

    fn add_frequency(&self, name: &str, grouped: bool) -> HostResult<()> {
        {
            let mut state = self.state.write();
            if state
                .frequencies
                .iter()
                .any(|f| f.name.eq_ignore_ascii_case(name))
            {
                return Ok(());
            }
            let entry = state
                .catalogue
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(name))
                .cloned()
                .ok_or_else(|| HostError::UnknownFrequencyName(name.to_string()))?;
            let handle = FrequencyHandle(state.allocate());
            state.frequencies.push(HostFrequency {
                handle,
                name: entry.name,
                friendly_name: entry.friendly_name,
                hertz: entry.hertz,
                alias_hertz: entry.alias_hertz,
                text_messages: Vec::new(),
                receive: grouped,
                receiving: false,
                transmit: false,
            });
        }
        self.fire(&[HostEvent::FrequenciesChanged]);
        Ok(())
    }

    fn remove_frequency(&self, frequency: FrequencyHandle) -> HostResult<()> {
        let cleared_primary = {
            let mut state = self.state.write();
            let before = state.frequencies.len();
            state.frequencies.retain(|f| f.handle != frequency);
            if state.frequencies.len() == before {
                return Err(HostError::UnknownFrequency(frequency.to_string()));
            }
            if state.primary == Some(frequency) {
                state.primary = None;
                true
            } else {
                false
            }
        };
        if cleared_primary {
            self.fire(&[
                HostEvent::FrequenciesChanged,
                HostEvent::PrimaryFrequencyChanged,
            ]);
        } else {
            self.fire(&[HostEvent::FrequenciesChanged]);
        }
        Ok(())
    }

    fn set_frequency_receive(&self, frequency: FrequencyHandle, enabled: bool) -> HostResult<()> {
        {
            let mut state = self.state.write();
            let f = state.frequency_mut(frequency)?;
            f.receive = enabled;
            if !enabled {
                f.transmit = false;
            }
        }
        self.fire(&[HostEvent::FrequencyStateChanged]);
        Ok(())
    }

    fn set_frequency_transmit(
        &self,
        frequency: FrequencyHandle,
        enabled: bool,
    ) -> HostResult<()> {
        {
            let mut state = self.state.write();
            if enabled && !state.valid_atc {
                return Err(HostError::NotAuthorized(
                    "transmit requires a valid ATC session".to_string(),
                ));
            }
            let f = state.frequency_mut(frequency)?;
            f.transmit = enabled;
            if enabled {
                f.receive = true;
            }
        }
        self.fire(&[HostEvent::FrequencyStateChanged]);
        Ok(())
    }

    fn set_primary_frequency(&self, frequency: Option<FrequencyHandle>) -> HostResult<()> {
        {
            let mut state = self.state.write();
            if let Some(handle) = frequency {
                state.frequency_mut(handle)?;
            }
            state.primary = frequency;
        }
        self.fire(&[HostEvent::PrimaryFrequencyChanged]);
        Ok(())
    }
}

impl HostEvents for SimulatedHost {
    fn subscribe(&self, listener: Arc<dyn HostEventListener>) {
        self.listeners.write().push(listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Listener that records every event it sees.
    #[derive(Default)]
    struct RecordingListener {
        events: Mutex<Vec<HostEvent>>,
    }

    impl HostEventListener for RecordingListener {
        fn on_host_event(&self, event: HostEvent) {
            self.events.lock().push(event);
        }
    }

    fn subscribed_demo() -> (SimulatedHost, Arc<RecordingListener>) {
        let host = SimulatedHost::demo_panel();
        let listener = Arc::new(RecordingListener::default());
        host.subscribe(listener.clone());
        (host, listener)
    }

    #[test]
    fn demo_panel_is_connected_with_lines_and_frequencies() {
        let host = SimulatedHost::demo_panel();
        assert!(host.panel_status().connected());
        assert!(host.is_valid_atc());
        assert_eq!(host.lines().len(), 3);
        assert_eq!(host.frequencies().len(), 3);
        assert_eq!(host.primary_frequency(), None);
    }

    #[test]
    fn transmit_implies_receive() {
        let (host, listener) = subscribed_demo();
        let twr = host.frequency_handle("ML_TWR").unwrap();

        host.set_frequency_transmit(twr, true).unwrap();
        let f = host.frequency(twr).unwrap();
        assert!(f.receive && f.transmit);

        host.set_frequency_receive(twr, false).unwrap();
        let f = host.frequency(twr).unwrap();
        assert!(!f.receive && !f.transmit);

        assert_eq!(
            *listener.events.lock(),
            vec![
                HostEvent::FrequencyStateChanged,
                HostEvent::FrequencyStateChanged
            ]
        );
    }

    #[test]
    fn transmit_rejected_without_atc_session() {
        let (host, _listener) = subscribed_demo();
        host.set_valid_atc(false);
        let twr = host.frequency_handle("ML_TWR").unwrap();

        let result = host.set_frequency_transmit(twr, true);
        assert!(matches!(result, Err(HostError::NotAuthorized(_))));
        assert!(!host.frequency(twr).unwrap().transmit);
    }

    #[test]
    fn revoking_atc_drops_transmit() {
        let host = SimulatedHost::demo_panel();
        let twr = host.frequency_handle("ML_TWR").unwrap();
        host.set_frequency_transmit(twr, true).unwrap();

        host.set_valid_atc(false);
        let f = host.frequency(twr).unwrap();
        assert!(f.receive);
        assert!(!f.transmit);
    }

    #[test]
    fn add_frequency_uses_catalogue_and_is_idempotent() {
        let (host, listener) = subscribed_demo();

        host.add_frequency("ml_del", true).unwrap();
        host.add_frequency("ML_DEL", false).unwrap();

        let added: Vec<_> = host
            .frequencies()
            .into_iter()
            .filter(|f| f.name == "ML_DEL")
            .collect();
        assert_eq!(added.len(), 1);
        assert!(added[0].receive, "grouped add joins the monitored group");
        assert_eq!(*listener.events.lock(), vec![HostEvent::FrequenciesChanged]);
    }

    #[test]
    fn add_unknown_frequency_fails() {
        let host = SimulatedHost::demo_panel();
        assert!(matches!(
            host.add_frequency("XX_CTR", false),
            Err(HostError::UnknownFrequencyName(_))
        ));
    }

    #[test]
    fn removing_primary_frequency_clears_primary() {
        let (host, listener) = subscribed_demo();
        let app = host.frequency_handle("ML_APP").unwrap();
        host.set_primary_frequency(Some(app)).unwrap();
        listener.events.lock().clear();

        host.remove_frequency(app).unwrap();
        assert_eq!(host.primary_frequency(), None);
        assert_eq!(
            *listener.events.lock(),
            vec![
                HostEvent::FrequenciesChanged,
                HostEvent::PrimaryFrequencyChanged
            ]
        );
    }

    #[test]
    fn primary_must_be_an_active_frequency() {
        let host = SimulatedHost::demo_panel();
        let result = host.set_primary_frequency(Some(FrequencyHandle(9999)));
        assert!(matches!(result, Err(HostError::UnknownFrequency(_))));
    }

    #[test]
    fn call_answer_hang_up_cycle() {
        let host = SimulatedHost::demo_panel();
        let gnd = host.line_handle("ML_GND").unwrap();
        let app = host.line_handle("ML_APP").unwrap();

        host.call_line(gnd).unwrap();
        assert_eq!(host.line(gnd).unwrap().state, LineState::Outgoing);

        host.call_line(app).unwrap();
        assert_eq!(host.line(app).unwrap().state, LineState::Connected);

        host.ring_line(gnd).unwrap();
        host.answer_line(gnd).unwrap();
        assert_eq!(host.line(gnd).unwrap().state, LineState::Connected);

        host.hang_up_line(gnd).unwrap();
        assert_eq!(host.line(gnd).unwrap().state, LineState::Idle);
    }

    #[test]
    fn listener_may_read_host_reentrantly() {
        struct Reader {
            host: Arc<SimulatedHost>,
            seen: Mutex<Vec<usize>>,
        }
        impl HostEventListener for Reader {
            fn on_host_event(&self, _event: HostEvent) {
                self.seen.lock().push(self.host.frequencies().len());
            }
        }

        let host = Arc::new(SimulatedHost::demo_panel());
        let reader = Arc::new(Reader {
            host: Arc::clone(&host),
            seen: Mutex::new(Vec::new()),
        });
        host.subscribe(reader.clone());

        host.add_frequency("BIK_CTR", false).unwrap();
        assert_eq!(*reader.seen.lock(), vec![4]);
    }
}
