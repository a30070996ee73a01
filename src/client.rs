//! Client Module
//!
//! Orchestrates a single cgminer API exchange per call.
//!
//! ## Call Lifecycle
//! ```text
//! Idle → Dialing → Connected → Sending → AwaitingResponse → Decoded | Failed
//! ```
//!
//! - The dial honours the call's [`Context`]
//! - The read/write deadline is `now + timeout`, fixed once connected
//! - The connection is dropped (closed) on every exit path

use std::io::BufReader;
use std::time::Duration;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::config::{join_host_port, Config};
use crate::context::Context;
use crate::error::{CgminerError, Result};
use crate::network::{DeadlineStream, Dialer, TcpDialer};
use crate::protocol::{read_framed, Command, Response, Transport, WireFormat};

/// cgminer API client
///
/// Immutable after construction; calls may run concurrently from several
/// threads as long as the dialer allows it.
#[derive(Debug, Clone)]
pub struct Client<D = TcpDialer, T = WireFormat> {
    /// API endpoint (`host:port`)
    address: String,

    /// Dial timeout and per-call deadline
    timeout: Duration,

    dialer: D,

    transport: T,
}

impl Client<TcpDialer, WireFormat> {
    /// Create a JSON client for `hostname:port` using a TCP dialer
    ///
    /// `timeout` bounds the dial as well as the exchange that follows.
    pub fn new(hostname: &str, port: u16, timeout: Duration) -> Self {
        Self {
            address: join_host_port(hostname, port),
            timeout,
            dialer: TcpDialer::new(timeout),
            transport: WireFormat::json(),
        }
    }

    /// Create a client from a validated config
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            address: config.address(),
            timeout: config.timeout,
            dialer: TcpDialer::new(config.timeout),
            transport: config.format.transport(),
        })
    }
}

impl<D: Dialer, T: Transport> Client<D, T> {
    /// Assemble a client from explicit parts
    pub fn with_parts(address: impl Into<String>, timeout: Duration, dialer: D, transport: T) -> Self {
        Self {
            address: address.into(),
            timeout,
            dialer,
            transport,
        }
    }

    /// Replace the transport
    pub fn with_transport<U: Transport>(self, transport: U) -> Client<D, U> {
        Client {
            address: self.address,
            timeout: self.timeout,
            dialer: self.dialer,
            transport,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn dialer(&self) -> &D {
        &self.dialer
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send `command` and decode the result into `out`
    ///
    /// Pass `None` for commands whose result is not needed; the status is
    /// still checked. Use [`Client::call_context`] to cancel the dial.
    pub fn call<O: DeserializeOwned>(&self, command: &Command, out: Option<&mut O>) -> Result<()> {
        self.call_context(&Context::background(), command, out)
    }

    /// Like [`Client::call`], with `ctx` governing the dial
    ///
    /// On error `out` is left untouched.
    pub fn call_context<O: DeserializeOwned>(
        &self,
        ctx: &Context,
        command: &Command,
        out: Option<&mut O>,
    ) -> Result<()> {
        let mut stream = self.connect(ctx)?;
        self.transport.send_command(&mut stream, command)?;

        let mut reader = BufReader::new(&mut stream);
        self.transport.decode_response(&mut reader, command, out)
    }

    /// Send `command` and return the normalised response without checking its status
    pub fn request(&self, ctx: &Context, command: &Command) -> Result<Response> {
        let mut stream = self.connect(ctx)?;
        self.transport.send_command(&mut stream, command)?;

        let mut reader = BufReader::new(&mut stream);
        self.transport.read_response(&mut reader, command)
    }

    /// Send `command` and return the raw framed payload
    ///
    /// No status check is made; interpreting the bytes is up to the caller.
    pub fn raw_call(&self, ctx: &Context, command: &Command) -> Result<Bytes> {
        let mut stream = self.connect(ctx)?;
        self.transport.send_command(&mut stream, command)?;

        let mut reader = BufReader::new(&mut stream);
        read_framed(&mut reader)
    }

    /// Dial and fix the call deadline
    fn connect(&self, ctx: &Context) -> Result<DeadlineStream<D::Conn>> {
        tracing::debug!("Connecting to cgminer at {}", self.address);
        let conn = self
            .dialer
            .dial_context(ctx, "tcp", &self.address)
            .map_err(|e| {
                tracing::debug!("Dial to {} failed: {}", self.address, e);
                CgminerError::Connect(e)
            })?;
        Ok(DeadlineStream::with_timeout(conn, self.timeout))
    }
}
