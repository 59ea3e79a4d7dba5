//! Centralized error types for the Remote VSCS core library.
//!
//! This module provides a unified error handling system that:
//! - Defines structured error types using `thiserror`
//! - Gives every error a machine-readable code for logs
//! - Converts the narrower module errors into [`BridgeError`]

use thiserror::Error;

use crate::host::HostError;
use crate::utils::AssetPathError;
use crate::vscs::command::CommandDecodeError;

/// Trait for error types that provide machine-readable error codes.
///
/// Implement this trait to provide consistent error codes across different
/// error conversion paths.
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;
}

impl ErrorCode for HostError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownLine(_) => "unknown_line",
            Self::UnknownFrequency(_) => "unknown_frequency",
            Self::UnknownFrequencyName(_) => "unknown_frequency_name",
            Self::NotAuthorized(_) => "not_authorized",
        }
    }
}

impl ErrorCode for CommandDecodeError {
    fn code(&self) -> &'static str {
        match self {
            Self::Json(_) => "invalid_json",
            Self::MissingName => "missing_command_name",
            Self::InvalidValue { .. } => "invalid_command_value",
        }
    }
}

impl ErrorCode for AssetPathError {
    fn code(&self) -> &'static str {
        match self {
            Self::Empty => "empty_path",
            Self::Traversal => "path_traversal",
            Self::ForbiddenExtension(_) => "forbidden_extension",
        }
    }
}

/// Application-wide error type for the Remote VSCS bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The host subsystem rejected or could not perform an operation.
    #[error("Host error: {0}")]
    Host(#[from] HostError),

    /// An inbound client message could not be decoded.
    #[error("Command decode failed: {0}")]
    Command(#[from] CommandDecodeError),

    /// Snapshot encoding or decoding failed.
    #[error("Snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem or socket error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration is invalid or incomplete.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl BridgeError {
    /// Returns a machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Host(e) => e.code(),
            Self::Command(e) => e.code(),
            Self::Serialization(_) => "serialization_error",
            Self::Io(_) => "io_error",
            Self::Configuration(_) => "configuration_error",
        }
    }
}

/// Convenient Result alias for application-wide operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_error_maps_to_its_code() {
        let err: BridgeError = HostError::UnknownLine("42".into()).into();
        assert_eq!(err.code(), "unknown_line");
    }

    #[test]
    fn configuration_error_returns_correct_code() {
        let err = BridgeError::Configuration("bad".into());
        assert_eq!(err.code(), "configuration_error");
        assert_eq!(err.to_string(), "Configuration error: bad");
    }

    #[test]
    fn decode_error_code_is_stable() {
        let err: BridgeError = CommandDecodeError::MissingName.into();
        assert_eq!(err.code(), "missing_command_name");
    }
}
