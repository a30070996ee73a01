//! Configuration for cgminer-api
//!
//! Centralized client configuration with sensible defaults.

use std::time::Duration;

use crate::error::{CgminerError, Result};
use crate::protocol::WireFormat;
use crate::DEFAULT_PORT;

/// Client configuration
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Endpoint Configuration
    // -------------------------------------------------------------------------
    /// Hostname or IP address of the cgminer API
    pub host: String,

    /// API port
    pub port: u16,

    // -------------------------------------------------------------------------
    // Call Configuration
    // -------------------------------------------------------------------------
    /// Applied to dialing, and as the per-call read/write deadline
    pub timeout: Duration,

    /// Wire format the daemon speaks
    pub format: Format,
}

/// Wire format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// JSON envelope (cgminer default)
    #[default]
    Json,

    /// Legacy pipe/comma-delimited text
    PlainText,
}

impl Format {
    /// Transport implementing this format
    pub fn transport(self) -> WireFormat {
        match self {
            Format::Json => WireFormat::json(),
            Format::PlainText => WireFormat::plain_text(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            timeout: Duration::from_secs(5),
            format: Format::Json,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Endpoint address in `host:port` form
    ///
    /// Bare IPv6 literals are bracketed so the result parses as a socket address.
    pub fn address(&self) -> String {
        join_host_port(&self.host, self.port)
    }

    /// Check that the config describes a usable endpoint
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(CgminerError::InvalidConfig("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(CgminerError::InvalidConfig("port must not be 0".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(CgminerError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Join a host and port, bracketing IPv6 literals
pub(crate) fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the API hostname
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the API port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the dial timeout and per-call deadline
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the timeout in milliseconds
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeout = Duration::from_millis(ms);
        self
    }

    /// Set the wire format
    pub fn format(mut self, format: Format) -> Self {
        self.config.format = format;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
