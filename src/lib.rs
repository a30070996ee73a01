//! # cgminer-api
//!
//! A client for the cgminer TCP API with:
//! - JSON and legacy plain-text wire formats behind one transport contract
//! - Null-terminated response framing
//! - A single fixed deadline per call (no refresh mid-transfer)
//! - Injectable dialer for testing without a live network
//!
//! ## Call Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Client                               │
//! │          dial → deadline → send → decode → close             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Dialer    │          │  Transport  │
//!   │ (TcpStream) │          │ JSON / Text │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │   Framing   │
//!                           │ (NUL-term)  │
//!                           └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//! use cgminer_api::{Client, Command};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Summary {
//!     #[serde(rename = "MHS av")]
//!     mhs_av: f64,
//! }
//!
//! let client = Client::new("127.0.0.1", 4028, Duration::from_secs(5));
//! let mut summary: Vec<Summary> = Vec::new();
//! client.call(&Command::new("summary"), Some(&mut summary))?;
//! # Ok::<(), cgminer_api::CgminerError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod context;

pub mod protocol;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CgminerError, Result};
pub use config::{Config, Format};
pub use context::Context;
pub use client::Client;
pub use protocol::{
    Command, JsonTransport, PlainTextTransport, Response, Status, StatusCode, Transport,
    WireFormat,
};
pub use network::{Connection, DeadlineStream, Dialer, TcpDialer};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Port cgminer listens on for API requests unless configured otherwise
pub const DEFAULT_PORT: u16 = 4028;
