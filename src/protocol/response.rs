//! Response definitions
//!
//! The normalised response model both transports decode into.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::de::from_value;
use crate::error::{CgminerError, Result};

/// Status letter reported in the `STATUS` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Success,
    Info,
    Warning,
    Error,
    Fatal,
}

impl StatusCode {
    /// Errors and fatal errors are failures; everything else succeeded
    pub fn is_success(self) -> bool {
        !matches!(self, StatusCode::Error | StatusCode::Fatal)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusCode::Success => "S",
            StatusCode::Info => "I",
            StatusCode::Warning => "W",
            StatusCode::Error => "E",
            StatusCode::Fatal => "F",
        }
    }
}

impl FromStr for StatusCode {
    type Err = CgminerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "S" => Ok(StatusCode::Success),
            "I" => Ok(StatusCode::Info),
            "W" => Ok(StatusCode::Warning),
            "E" => Ok(StatusCode::Error),
            "F" => Ok(StatusCode::Fatal),
            other => Err(CgminerError::Protocol(format!(
                "unknown status code {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The status section every response carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// Outcome letter
    pub code: StatusCode,

    /// Numeric message code (`Code`)
    pub number: Option<i64>,

    /// Human-readable message (`Msg`)
    pub message: String,

    /// Daemon description, usually its version string (`Description`)
    pub description: Option<String>,

    /// Unix timestamp of the response (`When`)
    pub when: Option<i64>,
}

impl Status {
    /// Parse a JSON status object
    pub(crate) fn from_json(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            CgminerError::Protocol("status section is not an object".to_string())
        })?;

        let code = match object.get("STATUS") {
            Some(Value::String(s)) => s.parse()?,
            Some(other) => {
                return Err(CgminerError::Protocol(format!(
                    "status code is not a string: {}",
                    other
                )))
            }
            None => {
                return Err(CgminerError::Protocol(
                    "status section has no STATUS field".to_string(),
                ))
            }
        };

        Ok(Self {
            code,
            number: json_int(object.get("Code"), "Code")?,
            message: object
                .get("Msg")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            description: object
                .get("Description")
                .and_then(Value::as_str)
                .map(str::to_string),
            when: json_int(object.get("When"), "When")?,
        })
    }

    /// Parse a plain-text status record from its `KEY=VALUE` fields
    pub(crate) fn from_fields(fields: &[(&str, &str)]) -> Result<Self> {
        let lookup = |key: &str| {
            fields
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| *v)
        };

        let code = lookup("STATUS")
            .ok_or_else(|| CgminerError::Protocol("status record has no STATUS field".to_string()))?
            .parse()?;
        let message = lookup("Msg")
            .ok_or_else(|| CgminerError::Protocol("status record has no Msg field".to_string()))?
            .to_string();

        Ok(Self {
            code,
            number: text_int(lookup("Code"), "Code")?,
            message,
            description: lookup("Description").map(str::to_string),
            when: text_int(lookup("When"), "When")?,
        })
    }
}

fn json_int(value: Option<&Value>, key: &str) -> Result<Option<i64>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| CgminerError::Protocol(format!("status {} is not an integer: {}", key, n))),
        Some(Value::String(s)) => text_int(Some(s.as_str()), key),
        Some(other) => Err(CgminerError::Protocol(format!(
            "status {} is not an integer: {}",
            key, other
        ))),
    }
}

fn text_int(value: Option<&str>, key: &str) -> Result<Option<i64>> {
    value
        .map(|raw| {
            raw.trim().parse().map_err(|_| {
                CgminerError::Protocol(format!("status {} is not an integer: {:?}", key, raw))
            })
        })
        .transpose()
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.number {
            Some(number) => write!(f, "[{} {}] {}", self.code, number, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

/// A decoded response, independent of wire format
#[derive(Debug, Clone)]
pub struct Response {
    /// Status section
    pub status: Status,

    /// Name of the result section, used to locate decode failures
    pub section: String,

    /// Result data, `None` when the response carries only a status
    pub body: Option<Value>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        self.status.code.is_success()
    }

    /// Turn a failure status into [`CgminerError::Api`]
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            tracing::warn!("cgminer reported failure: {}", self.status);
            Err(CgminerError::Api(self.status))
        }
    }

    /// Deserialize the result data, `None` when there is none
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        match &self.body {
            Some(body) => Ok(Some(from_value(body, &self.section)?)),
            None => Ok(None),
        }
    }

    /// Decode into `out`, leaving it untouched on error or when there is no data
    pub fn decode_into<T: DeserializeOwned>(&self, out: Option<&mut T>) -> Result<()> {
        let Some(out) = out else {
            return Ok(());
        };
        if let Some(value) = self.decode()? {
            *out = value;
        }
        Ok(())
    }
}
