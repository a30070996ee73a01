//! Error types for cgminer-api
//!
//! Provides a unified error type for all client operations.

use std::io;

use thiserror::Error;

use crate::protocol::{DecodeError, Status};

/// Result type alias using CgminerError
pub type Result<T> = std::result::Result<T, CgminerError>;

/// Unified error type for cgminer API calls
#[derive(Debug, Error)]
pub enum CgminerError {
    // -------------------------------------------------------------------------
    // Connection Errors
    // -------------------------------------------------------------------------
    /// Dialing the API endpoint failed (DNS, refused, timeout, cancelled)
    #[error("connect error ({0})")]
    Connect(#[source] io::Error),

    /// Writing the command to the connection failed
    #[error("failed to send cgminer command: {0}")]
    Send(#[source] io::Error),

    /// The stream closed or the deadline passed before a full response arrived
    #[error("failed to read response: {0}")]
    Read(#[source] io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("failed to encode command: {0}")]
    Encode(#[source] serde_json::Error),

    /// Response is structurally unusable (missing status section or fields)
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Well-formed response reporting a command-level failure
    #[error("cgminer API error: {0}")]
    Api(Status),

    /// A value could not be converted to the destination's type
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CgminerError {
    /// The underlying I/O error, if this error was caused by one
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            CgminerError::Connect(e) | CgminerError::Send(e) | CgminerError::Read(e) => Some(e),
            _ => None,
        }
    }

    /// Whether the failure was a timeout or an elapsed deadline
    ///
    /// Unix sockets report expired timeouts as `WouldBlock`, Windows as
    /// `TimedOut`; both count.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self.io_error().map(io::Error::kind),
            Some(io::ErrorKind::TimedOut) | Some(io::ErrorKind::WouldBlock)
        )
    }

    /// The status reported by cgminer for an API error
    pub fn api_status(&self) -> Option<&Status> {
        match self {
            CgminerError::Api(status) => Some(status),
            _ => None,
        }
    }
}
