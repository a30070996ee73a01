//! Transport contract
//!
//! A transport knows how to put a [`Command`] on the wire and how to turn
//! the daemon's reply into a [`Response`]. Both wire formats implement it;
//! [`WireFormat`] selects one at construction time.

use std::io::{BufRead, Write};

use serde::de::DeserializeOwned;

use super::{read_framed, Command, JsonTransport, PlainTextTransport, Response};
use crate::error::Result;

/// Encode commands and decode responses for one wire format
pub trait Transport {
    /// Write `command` to the connection
    fn send_command<W: Write + ?Sized>(&self, writer: &mut W, command: &Command) -> Result<()>;

    /// Normalise one framed payload (terminator already stripped)
    fn parse_response(&self, payload: &[u8], command: &Command) -> Result<Response>;

    /// Read one framed response and normalise it, without checking its status
    fn read_response<R: BufRead + ?Sized>(
        &self,
        reader: &mut R,
        command: &Command,
    ) -> Result<Response> {
        let payload = read_framed(reader)?;
        self.parse_response(&payload, command)
    }

    /// Read a response, fail on an error status, then decode into `out`
    ///
    /// With `out` set to `None` only the status is checked. `out` is never
    /// touched when an error is returned.
    fn decode_response<R, T>(
        &self,
        reader: &mut R,
        command: &Command,
        out: Option<&mut T>,
    ) -> Result<()>
    where
        R: BufRead + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.read_response(reader, command)?.error_for_status()?;
        response.decode_into(out)
    }
}

/// The transport a client is built with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    Json(JsonTransport),
    PlainText(PlainTextTransport),
}

impl WireFormat {
    pub fn json() -> Self {
        WireFormat::Json(JsonTransport)
    }

    pub fn plain_text() -> Self {
        WireFormat::PlainText(PlainTextTransport)
    }
}

impl Default for WireFormat {
    fn default() -> Self {
        Self::json()
    }
}

impl Transport for WireFormat {
    fn send_command<W: Write + ?Sized>(&self, writer: &mut W, command: &Command) -> Result<()> {
        match self {
            WireFormat::Json(t) => t.send_command(writer, command),
            WireFormat::PlainText(t) => t.send_command(writer, command),
        }
    }

    fn parse_response(&self, payload: &[u8], command: &Command) -> Result<Response> {
        match self {
            WireFormat::Json(t) => t.parse_response(payload, command),
            WireFormat::PlainText(t) => t.parse_response(payload, command),
        }
    }
}
