//! Core configuration types.
//!
//! [`Config`] carries everything the listeners need. The standalone server
//! builds it from YAML + environment + CLI; embedders construct it directly.

use std::net::IpAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::protocol_constants::{
    BOOTSTRAP_DOCUMENT, DEFAULT_BASE_PORT, HTTP_LINGER_MS, HTTP_MAX_REQUEST_BYTES,
    HTTP_MIN_REQUEST_BYTES, HTTP_READ_TIMEOUT_MS, HTTP_WRITE_TIMEOUT_MS, WS_PORT_OFFSET,
};

/// Configuration for the Remote VSCS bridge.
///
/// All fields have sensible defaults.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    // Server
    /// HTTP port. The WebSocket server listens on `base_port + 1`.
    pub base_port: u16,

    /// Address both listeners bind to.
    pub bind_address: IpAddr,

    // Static assets
    /// Directory holding the bootstrap document and static assets.
    pub asset_dir: PathBuf,

    /// File name (relative to `asset_dir`) of the document served for `GET /`.
    pub bootstrap_document: String,

    // HTTP timings
    /// Write timeout for one HTTP response (milliseconds).
    pub http_write_timeout_ms: u64,

    /// How long a closing connection drains peer input (milliseconds).
    pub http_linger_ms: u64,

    /// Time allowed for the request bytes to arrive (milliseconds).
    pub http_read_timeout_ms: u64,

    /// Maximum bytes read from one request.
    pub http_max_request_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_port: DEFAULT_BASE_PORT,
            bind_address: IpAddr::from([0, 0, 0, 0]),
            asset_dir: PathBuf::from("."),
            bootstrap_document: BOOTSTRAP_DOCUMENT.to_string(),
            http_write_timeout_ms: HTTP_WRITE_TIMEOUT_MS,
            http_linger_ms: HTTP_LINGER_MS,
            http_read_timeout_ms: HTTP_READ_TIMEOUT_MS,
            http_max_request_bytes: HTTP_MAX_REQUEST_BYTES,
        }
    }
}

impl Config {
    /// Port of the WebSocket listener.
    ///
    /// A base port of 0 asks the OS for an ephemeral port for each listener.
    #[must_use]
    pub fn ws_port(&self) -> u16 {
        if self.base_port == 0 {
            0
        } else {
            self.base_port.wrapping_add(WS_PORT_OFFSET)
        }
    }

    /// Validates the configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_port == u16::MAX {
            return Err("base_port must leave room for the WebSocket port (base + 1)".to_string());
        }
        if self.bootstrap_document.trim().is_empty() {
            return Err("bootstrap_document must not be empty".to_string());
        }
        if self.http_write_timeout_ms == 0 {
            return Err("http_write_timeout_ms must be >= 1".to_string());
        }
        if self.http_read_timeout_ms == 0 {
            return Err("http_read_timeout_ms must be >= 1".to_string());
        }
        if self.http_max_request_bytes < HTTP_MIN_REQUEST_BYTES {
            return Err(format!(
                "http_max_request_bytes must be >= {}",
                HTTP_MIN_REQUEST_BYTES
            ));
        }
        Ok(())
    }

    /// Full path of the bootstrap document.
    #[must_use]
    pub fn bootstrap_path(&self) -> PathBuf {
        self.asset_dir.join(&self.bootstrap_document)
    }
}
