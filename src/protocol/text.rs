//! Plain-text transport
//!
//! Request: `<name>` or `<name>,<p1>,<p2>`. Response: sections separated by
//! `|` (or `;` on some firmware), fields by `,`, each field `KEY=VALUE`.
//! The first section is the status record; the rest are result records,
//! optionally led by a bare tag naming the section:
//!
//! ```text
//! STATUS=S,When=1700000000,Code=11,Msg=Summary,Description=cgminer 4.12.0|SUMMARY,Elapsed=90,MHS av=1500.00|
//! ```
//!
//! cgminer escapes `|`, `,`, `=` and `\` inside values with a backslash.

use std::io::Write;

use serde_json::{Map, Value};

use super::json::trim_payload;
use super::{Command, Response, Status, Transport};
use crate::error::{CgminerError, Result};

/// Legacy plain-text wire format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlainTextTransport;

const SECTION_SEPARATORS: &[char] = &['|', ';'];
const FIELD_SEPARATOR: &[char] = &[','];
const KEY_VALUE_SEPARATOR: &[char] = &['='];
const ESCAPE: char = '\\';

impl PlainTextTransport {
    /// Encode a command as `name[,param...]`
    pub fn encode_command(command: &Command) -> Vec<u8> {
        match command.joined_params() {
            Some(params) => format!("{},{}", command.name(), params).into_bytes(),
            None => command.name().as_bytes().to_vec(),
        }
    }

    /// Decode a plain-text request, as the daemon would
    pub fn decode_command(bytes: &[u8]) -> Result<Command> {
        let text = std::str::from_utf8(trim_payload(bytes))
            .map_err(|e| CgminerError::Protocol(format!("request is not UTF-8: {}", e)))?;

        let mut parts = text.split(',');
        let name = parts.next().unwrap_or_default().trim();
        if name.is_empty() {
            return Err(CgminerError::Protocol("request has an empty command".to_string()));
        }
        Ok(Command::new(name).with_params(parts))
    }
}

impl Transport for PlainTextTransport {
    fn send_command<W: Write + ?Sized>(&self, writer: &mut W, command: &Command) -> Result<()> {
        let bytes = Self::encode_command(command);
        tracing::debug!("Sending plain-text command '{}' ({} bytes)", command.name(), bytes.len());

        writer.write_all(&bytes).map_err(CgminerError::Send)?;
        writer.flush().map_err(CgminerError::Send)?;
        Ok(())
    }

    fn parse_response(&self, payload: &[u8], command: &Command) -> Result<Response> {
        let text = std::str::from_utf8(trim_payload(payload))
            .map_err(|e| CgminerError::Protocol(format!("response is not UTF-8: {}", e)))?;

        let mut sections = split_escaped(text, SECTION_SEPARATORS)
            .into_iter()
            .map(str::trim)
            .filter(|section| !section.is_empty());

        let status_section = sections
            .next()
            .ok_or_else(|| CgminerError::Protocol("empty response".to_string()))?;
        let status = parse_status(status_section)?;
        tracing::debug!("Command '{}' returned status {}", command.name(), status);

        // Failure responses carry nothing worth parsing
        if !status.code.is_success() {
            return Ok(Response {
                status,
                section: command.name().to_uppercase(),
                body: None,
            });
        }

        let mut tag = None;
        let mut records = Vec::new();
        for (index, section) in sections.enumerate() {
            let (record_tag, record) = parse_record(section, index)?;
            if tag.is_none() {
                tag = record_tag;
            }
            if !record.is_empty() {
                records.push(Value::Object(record));
            }
        }

        let section = tag
            .or_else(|| command.result_key().map(str::to_string))
            .unwrap_or_else(|| command.name().to_uppercase());
        let body = if records.is_empty() {
            None
        } else {
            Some(Value::Array(records))
        };

        Ok(Response {
            status,
            section,
            body,
        })
    }
}

/// Parse the leading status record; every field must be `KEY=VALUE`
fn parse_status(section: &str) -> Result<Status> {
    let mut fields = Vec::new();
    for raw in fields_of(section) {
        let (key, value) = split_key_value(raw).ok_or_else(|| {
            CgminerError::Protocol(format!("unparseable status field {:?}", raw))
        })?;
        fields.push((unescape(key), unescape(value)));
    }

    let borrowed: Vec<(&str, &str)> = fields
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    Status::from_fields(&borrowed)
}

/// Parse one result record into its optional tag and its fields
fn parse_record(section: &str, index: usize) -> Result<(Option<String>, Map<String, Value>)> {
    let mut tag = None;
    let mut record = Map::new();

    for (position, raw) in fields_of(section).enumerate() {
        match split_key_value(raw) {
            Some((key, value)) => {
                record.insert(unescape(key), Value::String(unescape(value)));
            }
            None if position == 0 => tag = Some(unescape(raw)),
            None => {
                return Err(CgminerError::Protocol(format!(
                    "unparseable field {:?} in record {}",
                    raw, index
                )))
            }
        }
    }

    Ok((tag, record))
}

/// Non-empty, trimmed fields of a section
fn fields_of(section: &str) -> impl Iterator<Item = &str> {
    split_escaped(section, FIELD_SEPARATOR)
        .into_iter()
        .map(str::trim)
        .filter(|field| !field.is_empty())
}

/// Split a field at its first unescaped `=`
fn split_key_value(field: &str) -> Option<(&str, &str)> {
    let (at, sep) = find_unescaped(field, KEY_VALUE_SEPARATOR)?;
    Some((field[..at].trim(), field[at + sep.len_utf8()..].trim()))
}

fn find_unescaped(text: &str, separators: &[char]) -> Option<(usize, char)> {
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
        } else if c == ESCAPE {
            escaped = true;
        } else if separators.contains(&c) {
            return Some((i, c));
        }
    }
    None
}

fn split_escaped<'a>(text: &'a str, separators: &[char]) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut rest = text;
    while let Some((at, sep)) = find_unescaped(rest, separators) {
        parts.push(&rest[..at]);
        rest = &rest[at + sep.len_utf8()..];
    }
    parts.push(rest);
    parts
}

fn unescape(raw: &str) -> String {
    if !raw.contains(ESCAPE) {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == ESCAPE {
            out.push(chars.next().unwrap_or(ESCAPE));
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_escaped_keeps_escaped_separators() {
        assert_eq!(split_escaped(r"a|b\|c;d", SECTION_SEPARATORS), vec!["a", r"b\|c", "d"]);
    }

    #[test]
    fn test_split_key_value_first_unescaped_equals() {
        assert_eq!(split_key_value(r"Msg=a=b"), Some(("Msg", "a=b")));
        assert_eq!(split_key_value(r"K\=1=v"), Some((r"K\=1", "v")));
        assert_eq!(split_key_value("SUMMARY"), None);
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"x\,y\|z\\"), r"x,y|z\");
        assert_eq!(unescape("plain"), "plain");
    }

    #[test]
    fn test_record_tag_and_fields() {
        let (tag, record) = parse_record("POOL=0,URL=stratum+tcp://pool:3333,,Status=Alive", 0).unwrap();
        assert_eq!(tag, None);
        assert_eq!(record.len(), 3);

        let (tag, _) = parse_record("SUMMARY,Elapsed=5", 0).unwrap();
        assert_eq!(tag.as_deref(), Some("SUMMARY"));
    }

    #[test]
    fn test_bare_field_after_first_is_rejected() {
        assert!(parse_record("Elapsed=5,oops", 2).is_err());
    }
}
