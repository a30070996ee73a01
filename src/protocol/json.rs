//! JSON transport
//!
//! Request: `{"command":"<name>","parameter":"<p1,p2>"}` with `parameter`
//! omitted when there are none. Response: an object holding a `STATUS`
//! section plus the result section keyed by the command's result key.

use std::io::Write;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::de::DecodeError;
use super::{Command, Response, Status, Transport};
use crate::error::{CgminerError, Result};

/// JSON wire format (cgminer default)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonTransport;

#[derive(Serialize)]
struct Request<'a> {
    command: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameter: Option<String>,
}

#[derive(Deserialize)]
struct IncomingRequest {
    command: String,
    parameter: Option<String>,
}

impl JsonTransport {
    /// Encode a command as a JSON request object
    pub fn encode_command(command: &Command) -> Result<Vec<u8>> {
        let request = Request {
            command: command.name(),
            parameter: command.joined_params(),
        };
        serde_json::to_vec(&request).map_err(CgminerError::Encode)
    }

    /// Decode a JSON request object, as the daemon would
    pub fn decode_command(bytes: &[u8]) -> Result<Command> {
        let request: IncomingRequest =
            serde_json::from_slice(trim_payload(bytes)).map_err(DecodeError::Json)?;

        if request.command.trim().is_empty() {
            return Err(CgminerError::Protocol("request has an empty command".to_string()));
        }

        let command = Command::new(request.command);
        Ok(match request.parameter {
            Some(parameter) if !parameter.is_empty() => command.with_params(parameter.split(',')),
            _ => command,
        })
    }
}

impl Transport for JsonTransport {
    fn send_command<W: Write + ?Sized>(&self, writer: &mut W, command: &Command) -> Result<()> {
        let bytes = Self::encode_command(command)?;
        tracing::debug!("Sending JSON command '{}' ({} bytes)", command.name(), bytes.len());

        writer.write_all(&bytes).map_err(CgminerError::Send)?;
        writer.flush().map_err(CgminerError::Send)?;
        Ok(())
    }

    fn parse_response(&self, payload: &[u8], command: &Command) -> Result<Response> {
        let payload = trim_payload(payload);
        if payload.is_empty() {
            return Err(CgminerError::Protocol("empty response".to_string()));
        }

        let root: Value = serde_json::from_slice(payload).map_err(DecodeError::Json)?;
        let Value::Object(mut root) = root else {
            return Err(CgminerError::Protocol(
                "response is not a JSON object".to_string(),
            ));
        };

        let status = match root.remove("STATUS") {
            Some(Value::Array(items)) => items.into_iter().next().ok_or_else(|| {
                CgminerError::Protocol("status section is empty".to_string())
            })?,
            Some(other) => other,
            None => return Err(CgminerError::Protocol("missing status section".to_string())),
        };
        let status = Status::from_json(&status)?;
        tracing::debug!("Command '{}' returned status {}", command.name(), status);

        let (section, body) = match command.result_key() {
            Some(key) => {
                let body = take_section(&mut root, key);
                (key.to_string(), body)
            }
            None => (command.name().to_uppercase(), None),
        };

        Ok(Response {
            status,
            section,
            body,
        })
    }
}

/// Remove the result section, matching the key case-insensitively as a fallback
fn take_section(root: &mut Map<String, Value>, key: &str) -> Option<Value> {
    if let Some(value) = root.remove(key) {
        return Some(value);
    }
    let actual = root.keys().find(|k| k.eq_ignore_ascii_case(key))?.clone();
    root.remove(&actual)
}

/// Strip surrounding whitespace and stray NUL bytes some firmware appends
pub(crate) fn trim_payload(payload: &[u8]) -> &[u8] {
    let is_padding = |b: &u8| b.is_ascii_whitespace() || *b == 0;
    let start = payload
        .iter()
        .position(|b| !is_padding(b))
        .unwrap_or(payload.len());
    let end = payload
        .iter()
        .rposition(|b| !is_padding(b))
        .map_or(start, |i| i + 1);
    &payload[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_payload() {
        assert_eq!(trim_payload(b"  {}\n\0"), b"{}");
        assert_eq!(trim_payload(b"\0\0"), b"");
        assert_eq!(trim_payload(b""), b"");
    }

    #[test]
    fn test_result_key_case_fallback() {
        let payload = br#"{"STATUS":[{"STATUS":"S","Msg":"ok"}],"Summary":[{"Elapsed":5}]}"#;
        let response = JsonTransport
            .parse_response(payload, &Command::new("summary"))
            .unwrap();
        assert!(response.body.is_some());
    }
}
