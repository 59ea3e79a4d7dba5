//! Inbound client commands.
//!
//! Clients send `{"CommandName": "<name>", "Value": <value>}`. Lines and
//! frequencies are referenced by their numeric snapshot id, sent either as a
//! JSON number or as a string of decimal digits. Only `AddFreq` and
//! `AddFreqGroup` take a frequency *name*, since their target is not on the
//! panel yet.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors from decoding an inbound message.
#[derive(Debug, Error)]
pub enum CommandDecodeError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message has no CommandName")]
    MissingName,

    #[error("{command} expects {expected}")]
    InvalidValue {
        command: &'static str,
        expected: &'static str,
    },
}

/// Raw wire shape of a client message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommandMessage {
    #[serde(rename = "CommandName", default)]
    pub command_name: Option<String>,
    #[serde(rename = "Value", default)]
    pub value: Value,
}

/// A decoded client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VscsCommand {
    Group(bool),
    AllToSpeaker(bool),
    TonesToSpeaker(bool),
    /// Line id.
    Call(u32),
    Answer(u32),
    HangUp(u32),
    /// Frequency name.
    AddFreq(String),
    /// Frequency name; the frequency joins the monitored group.
    AddFreqGroup(String),
    /// Frequency id.
    RemoveFreq(u32),
    /// Frequency id, or `None` to clear the primary frequency.
    Primary(Option<u32>),
    Idle(u32),
    Receive(u32),
    Transmit(u32),
    /// Any name outside the vocabulary. Dispatching it changes nothing.
    Unknown(String),
}

impl VscsCommand {
    /// Decodes one inbound text message.
    pub fn decode(text: &str) -> Result<Self, CommandDecodeError> {
        let message: CommandMessage = serde_json::from_str(text)?;
        Self::from_message(message)
    }

    /// Interprets an already-parsed message.
    pub fn from_message(message: CommandMessage) -> Result<Self, CommandDecodeError> {
        let name = match message.command_name {
            Some(name) if !name.is_empty() => name,
            _ => return Err(CommandDecodeError::MissingName),
        };
        let value = &message.value;

        let command = match name.as_str() {
            "Group" => Self::Group(bool_value("Group", value)?),
            "AllToSpeaker" => Self::AllToSpeaker(bool_value("AllToSpeaker", value)?),
            "TonesToSpeaker" => Self::TonesToSpeaker(bool_value("TonesToSpeaker", value)?),
            "Call" => Self::Call(id_value("Call", value)?),
            "Answer" => Self::Answer(id_value("Answer", value)?),
            "HangUp" => Self::HangUp(id_value("HangUp", value)?),
            "AddFreq" => Self::AddFreq(name_value("AddFreq", value)?),
            "AddFreqGroup" => Self::AddFreqGroup(name_value("AddFreqGroup", value)?),
            "RemoveFreq" => Self::RemoveFreq(id_value("RemoveFreq", value)?),
            "Primary" => Self::Primary(match value {
                Value::Null => None,
                Value::String(s) if s.trim().is_empty() => None,
                other => Some(id_value("Primary", other)?),
            }),
            "Idle" => Self::Idle(id_value("Idle", value)?),
            "Receive" => Self::Receive(id_value("Receive", value)?),
            "Transmit" => Self::Transmit(id_value("Transmit", value)?),
            _ => Self::Unknown(name),
        };
        Ok(command)
    }

    /// Wire name of the command.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Group(_) => "Group",
            Self::AllToSpeaker(_) => "AllToSpeaker",
            Self::TonesToSpeaker(_) => "TonesToSpeaker",
            Self::Call(_) => "Call",
            Self::Answer(_) => "Answer",
            Self::HangUp(_) => "HangUp",
            Self::AddFreq(_) => "AddFreq",
            Self::AddFreqGroup(_) => "AddFreqGroup",
            Self::RemoveFreq(_) => "RemoveFreq",
            Self::Primary(_) => "Primary",
            Self::Idle(_) => "Idle",
            Self::Receive(_) => "Receive",
            Self::Transmit(_) => "Transmit",
            Self::Unknown(name) => name,
        }
    }

    /// Whether the command changes which frequencies are on the panel.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::AddFreq(_) | Self::AddFreqGroup(_) | Self::RemoveFreq(_)
        )
    }

    /// Wire form of the command, as a client would send it.
    pub fn to_message(&self) -> CommandMessage {
        let value = match self {
            Self::Group(b) | Self::AllToSpeaker(b) | Self::TonesToSpeaker(b) => Value::Bool(*b),
            Self::Call(id)
            | Self::Answer(id)
            | Self::HangUp(id)
            | Self::RemoveFreq(id)
            | Self::Idle(id)
            | Self::Receive(id)
            | Self::Transmit(id) => Value::from(*id),
            Self::Primary(id) => id.map(Value::from).unwrap_or(Value::Null),
            Self::AddFreq(name) | Self::AddFreqGroup(name) => Value::String(name.clone()),
            Self::Unknown(_) => Value::Null,
        };
        CommandMessage {
            command_name: Some(self.name().to_string()),
            value,
        }
    }

    pub fn to_json(&self) -> String {
        // A map of strings and plain JSON values always serializes.
        serde_json::to_string(&self.to_message()).unwrap_or_default()
    }
}

fn bool_value(command: &'static str, value: &Value) -> Result<bool, CommandDecodeError> {
    let invalid = CommandDecodeError::InvalidValue {
        command,
        expected: "a boolean",
    };
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(invalid),
    }
}

fn id_value(command: &'static str, value: &Value) -> Result<u32, CommandDecodeError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => {
            let s = s.trim();
            if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
                s.parse::<u32>().ok()
            } else {
                None
            }
        }
        _ => None,
    };
    parsed.ok_or(CommandDecodeError::InvalidValue {
        command,
        expected: "a numeric id",
    })
}

fn name_value(command: &'static str, value: &Value) -> Result<String, CommandDecodeError> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(CommandDecodeError::InvalidValue {
            command,
            expected: "a frequency name",
        }),
    }
}
