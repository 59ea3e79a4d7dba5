//! Server configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Server configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP port. The WebSocket service listens on `base_port + 1`.
    /// Override: `REMOTE_VSCS_BASE_PORT`
    pub base_port: u16,

    /// Address both listeners bind to.
    /// Override: `REMOTE_VSCS_BIND_ADDRESS`
    pub bind_address: IpAddr,

    /// Directory holding the bootstrap page and static assets.
    /// Override: `REMOTE_VSCS_ASSET_DIR`
    pub asset_dir: PathBuf,

    /// File name of the page served for `/`.
    pub bootstrap_document: String,

    /// Write timeout for one HTTP response, in milliseconds.
    pub http_write_timeout_ms: u64,

    /// Seed the simulated panel with demo lines and frequencies.
    pub demo_panel: bool,

    /// Whether the simulated panel has a valid ATC session (transmit allowed).
    pub valid_atc: bool,

    /// Log every host event at debug level.
    pub log_host_events: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let core = remote_vscs_core::Config::default();
        Self {
            base_port: core.base_port,
            bind_address: core.bind_address,
            asset_dir: PathBuf::from("assets"),
            bootstrap_document: core.bootstrap_document,
            http_write_timeout_ms: core.http_write_timeout_ms,
            demo_panel: true,
            valid_atc: true,
            log_host_events: false,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_yaml(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parses a YAML document; missing keys keep their defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Applies environment variable overrides to the configuration.
    ///
    /// Unparseable values are ignored with a warning.
    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("REMOTE_VSCS_BASE_PORT") {
            match val.parse() {
                Ok(port) => self.base_port = port,
                Err(_) => log::warn!("Ignoring invalid REMOTE_VSCS_BASE_PORT: {}", val),
            }
        }

        if let Some(val) = var("REMOTE_VSCS_BIND_ADDRESS") {
            match val.parse() {
                Ok(ip) => self.bind_address = ip,
                Err(_) => log::warn!("Ignoring invalid REMOTE_VSCS_BIND_ADDRESS: {}", val),
            }
        }

        if let Some(val) = var("REMOTE_VSCS_ASSET_DIR") {
            if !val.is_empty() {
                self.asset_dir = PathBuf::from(val);
            }
        }

        // Note: REMOTE_VSCS_LOG_LEVEL is handled by clap via #[arg(env = ...)] in main.rs
    }

    /// Converts to remote-vscs-core's Config type.
    pub fn to_core_config(&self) -> remote_vscs_core::Config {
        remote_vscs_core::Config {
            base_port: self.base_port,
            bind_address: self.bind_address,
            asset_dir: self.asset_dir.clone(),
            bootstrap_document: self.bootstrap_document.clone(),
            http_write_timeout_ms: self.http_write_timeout_ms,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_core_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.base_port, 7673);
        assert!(config.demo_panel);
        assert!(config.valid_atc);
        let core = config.to_core_config();
        assert_eq!(core.ws_port(), 7674);
        assert_eq!(core.bootstrap_path(), PathBuf::from("assets/vscs.html"));
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = ServerConfig::from_yaml("base_port: 9000\nvalid_atc: false\n").unwrap();
        assert_eq!(config.base_port, 9000);
        assert!(!config.valid_atc);
        assert_eq!(config.asset_dir, PathBuf::from("assets"));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind_address: 127.0.0.1").unwrap();
        writeln!(file, "asset_dir: /srv/vscs").unwrap();

        let config = ServerConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.bind_address, IpAddr::from([127, 0, 0, 1]));
        assert_eq!(config.asset_dir, PathBuf::from("/srv/vscs"));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = ServerConfig::load(Some(Path::new("/nonexistent/remote-vscs.yaml")))
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = ServerConfig::default();
        config.apply_env_overrides(env(&[
            ("REMOTE_VSCS_BASE_PORT", "8100"),
            ("REMOTE_VSCS_BIND_ADDRESS", "127.0.0.1"),
            ("REMOTE_VSCS_ASSET_DIR", "/opt/vscs"),
        ]));
        assert_eq!(config.base_port, 8100);
        assert_eq!(config.bind_address, IpAddr::from([127, 0, 0, 1]));
        assert_eq!(config.asset_dir, PathBuf::from("/opt/vscs"));
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let mut config = ServerConfig::default();
        config.apply_env_overrides(env(&[
            ("REMOTE_VSCS_BASE_PORT", "seventy"),
            ("REMOTE_VSCS_BIND_ADDRESS", "not-an-ip"),
        ]));
        assert_eq!(config.base_port, 7673);
        assert_eq!(config.bind_address, IpAddr::from([0, 0, 0, 0]));
    }
}
