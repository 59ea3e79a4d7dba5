//! Applies client commands to the host.
//!
//! References are resolved against the current snapshot; anything that does
//! not resolve is ignored. Every dispatch, applied or not, ends in a snapshot
//! rebuild and broadcast so the sender and all other clients converge on the
//! host's actual state.

use std::sync::Arc;

use super::state_sync::{RebuildScope, StateSync};
use crate::host::{FrequencyHandle, FrequencyMode, HostError, HostResult, LineHandle, VscsHost};
use crate::vscs::{Snapshot, VscsCommand};

/// Why a command caused no host mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The command name is outside the vocabulary.
    UnknownCommand,
    /// No line with this id is on the panel.
    UnknownLine(u32),
    /// No frequency with this id is on the panel.
    UnknownFrequency(u32),
    /// Transmit requested without a valid ATC session.
    NotAuthorized,
}

/// Result of dispatching one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The host accepted the mutation.
    Applied,
    /// Nothing was sent to the host.
    Ignored(IgnoreReason),
    /// The host refused the mutation.
    Rejected(HostError),
}

/// Resolves and applies client commands.
pub struct CommandDispatcher {
    sync: Arc<StateSync>,
}

impl CommandDispatcher {
    pub fn new(sync: Arc<StateSync>) -> Self {
        Self { sync }
    }

    /// Applies `command`, then rebuilds and broadcasts the snapshot.
    ///
    /// Calls into the host synchronously; run it on the blocking pool.
    pub fn dispatch(&self, command: &VscsCommand) -> DispatchOutcome {
        let snapshot = self.sync.snapshot();
        let host = self.sync.host();

        let outcome = match self.apply(host.as_ref(), &snapshot, command) {
            Ok(()) => DispatchOutcome::Applied,
            Err(Skip::Ignored(reason)) => {
                log::debug!("[Dispatch] Ignoring {}: {:?}", command.name(), reason);
                DispatchOutcome::Ignored(reason)
            }
            Err(Skip::Host(e)) => {
                log::warn!("[Dispatch] Host rejected {}: {}", command.name(), e);
                DispatchOutcome::Rejected(e)
            }
        };

        let scope = if command.is_structural() {
            RebuildScope::Structure
        } else {
            RebuildScope::Flags
        };
        if let Err(e) = self.sync.refresh(scope) {
            log::warn!("[Dispatch] Rebuild after {} failed: {}", command.name(), e);
        }
        outcome
    }

    fn apply(
        &self,
        host: &dyn VscsHost,
        snapshot: &Snapshot,
        command: &VscsCommand,
    ) -> Result<(), Skip> {
        match command {
            VscsCommand::Group(on) => host.set_group(*on)?,
            VscsCommand::AllToSpeaker(on) => host.set_all_to_speaker(*on)?,
            VscsCommand::TonesToSpeaker(on) => host.set_tones_to_speaker(*on)?,
            VscsCommand::Call(id) => host.call_line(line(snapshot, *id)?)?,
            VscsCommand::Answer(id) => host.answer_line(line(snapshot, *id)?)?,
            VscsCommand::HangUp(id) => host.hang_up_line(line(snapshot, *id)?)?,
            VscsCommand::AddFreq(name) => host.add_frequency(name, false)?,
            VscsCommand::AddFreqGroup(name) => host.add_frequency(name, true)?,
            VscsCommand::RemoveFreq(id) => host.remove_frequency(frequency(snapshot, *id)?)?,
            VscsCommand::Primary(id) => {
                let handle = id.map(|id| frequency(snapshot, id)).transpose()?;
                host.set_primary_frequency(handle)?
            }
            VscsCommand::Idle(id) => {
                set_mode(host, frequency(snapshot, *id)?, FrequencyMode::Idle)?
            }
            VscsCommand::Receive(id) => {
                set_mode(host, frequency(snapshot, *id)?, FrequencyMode::Receiving)?
            }
            VscsCommand::Transmit(id) => {
                let handle = frequency(snapshot, *id)?;
                if !host.is_valid_atc() {
                    return Err(Skip::Ignored(IgnoreReason::NotAuthorized));
                }
                set_mode(host, handle, FrequencyMode::Transmitting)?
            }
            VscsCommand::Unknown(_) => return Err(Skip::Ignored(IgnoreReason::UnknownCommand)),
        }
        Ok(())
    }
}

enum Skip {
    Ignored(IgnoreReason),
    Host(HostError),
}

impl From<HostError> for Skip {
    fn from(e: HostError) -> Self {
        Self::Host(e)
    }
}

/// Drives a frequency into `mode`.
///
/// Transmit implies receive on the host, so entering `Transmitting` is one
/// call and a refusal leaves the frequency untouched.
fn set_mode(host: &dyn VscsHost, handle: FrequencyHandle, mode: FrequencyMode) -> HostResult<()> {
    match mode.flags() {
        (_, true) => host.set_frequency_transmit(handle, true),
        (receive, false) => {
            host.set_frequency_transmit(handle, false)?;
            host.set_frequency_receive(handle, receive)
        }
    }
}

fn line(snapshot: &Snapshot, id: u32) -> Result<LineHandle, Skip> {
    snapshot
        .line_by_id(id)
        .and_then(|l| l.handle)
        .ok_or(Skip::Ignored(IgnoreReason::UnknownLine(id)))
}

fn frequency(snapshot: &Snapshot, id: u32) -> Result<FrequencyHandle, Skip> {
    snapshot
        .frequency_by_id(id)
        .and_then(|f| f.handle)
        .ok_or(Skip::Ignored(IgnoreReason::UnknownFrequency(id)))
}
