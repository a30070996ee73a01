//! Lenient value deserializer
//!
//! cgminer is inconsistent about value types: the plain-text format is all
//! text, and JSON firmware frequently sends numbers and booleans as
//! strings. Destinations declare the semantic type; this deserializer
//! converts text to it and reports the exact path and raw value when it
//! cannot.

use std::fmt;

use serde::de::value::BorrowedStrDeserializer;
use serde::de::{
    self, DeserializeOwned, DeserializeSeed, Deserializer, MapAccess, SeqAccess, Visitor,
};
use serde_json::{Map, Value};
use thiserror::Error;

/// Failure converting a response into the destination type
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A text or JSON value could not be converted to the declared type
    #[error("invalid value {value:?} for `{path}`: expected {expected}")]
    InvalidValue {
        path: String,
        value: String,
        expected: &'static str,
    },

    /// Raised by the destination's `Deserialize` impl (missing field, wrong shape)
    #[error("{message}{}", at_path(.path))]
    Custom {
        path: Option<String>,
        message: String,
    },
}

fn at_path(path: &Option<String>) -> String {
    match path {
        Some(path) => format!(" at `{}`", path),
        None => String::new(),
    }
}

impl DecodeError {
    /// Attach a location to an error that has none yet
    fn with_path(self, location: &str) -> Self {
        match self {
            DecodeError::Custom { path: None, message } => DecodeError::Custom {
                path: Some(location.to_string()),
                message,
            },
            other => other,
        }
    }
}

impl de::Error for DecodeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        DecodeError::Custom {
            path: None,
            message: msg.to_string(),
        }
    }
}

/// Deserialize `value` into `T`, naming `root` in error paths
///
/// Text is only converted to numbers and booleans when `T` asks for one.
/// Types that buffer their input first, such as `#[serde(flatten)]` fields
/// and `#[serde(untagged)]` enums, see the raw strings and so reject
/// plain-text numbers a plain struct field would accept.
pub fn from_value<T: DeserializeOwned>(value: &Value, root: &str) -> Result<T, DecodeError> {
    T::deserialize(ValueDeserializer::new(value, root.to_string()))
        .map_err(|e| e.with_path(root))
}

fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "y" | "yes" | "1" => Some(true),
        "false" | "n" | "no" | "0" => Some(false),
        _ => None,
    }
}

// =============================================================================
// Value Deserializer
// =============================================================================

struct ValueDeserializer<'a> {
    value: &'a Value,
    path: String,
}

impl<'a> ValueDeserializer<'a> {
    fn new(value: &'a Value, path: String) -> Self {
        Self { value, path }
    }

    fn invalid(&self, expected: &'static str) -> DecodeError {
        let value = match self.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        DecodeError::InvalidValue {
            path: self.path.clone(),
            value,
            expected,
        }
    }
}

macro_rules! deserialize_number {
    ($method:ident, $visit:ident, $ty:ty) => {
        fn $method<V: Visitor<'a>>(self, visitor: V) -> Result<V::Value, DecodeError> {
            let parsed = match self.value {
                Value::Number(n) => n.to_string().parse::<$ty>().ok(),
                Value::String(s) => s.trim().parse::<$ty>().ok(),
                _ => None,
            };
            match parsed {
                Some(v) => visitor.$visit(v),
                None => Err(self.invalid(stringify!($ty))),
            }
        }
    };
}

impl<'a> Deserializer<'a> for ValueDeserializer<'a> {
    type Error = DecodeError;

    fn deserialize_any<V: Visitor<'a>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(*b),
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    visitor.visit_u64(u)
                } else if let Some(i) = n.as_i64() {
                    visitor.visit_i64(i)
                } else {
                    match n.as_f64() {
                        Some(f) => visitor.visit_f64(f),
                        None => Err(self.invalid("number")),
                    }
                }
            }
            Value::String(s) => visitor.visit_borrowed_str(s),
            Value::Array(items) => visitor.visit_seq(SeqDeserializer::new(items, self.path)),
            Value::Object(map) => visitor.visit_map(MapDeserializer::new(map, self.path)),
        }
    }

    fn deserialize_bool<V: Visitor<'a>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        let parsed = match self.value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_u64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            Value::String(s) => parse_bool(s),
            _ => None,
        };
        match parsed {
            Some(b) => visitor.visit_bool(b),
            None => Err(self.invalid("bool")),
        }
    }

    deserialize_number!(deserialize_i8, visit_i8, i8);
    deserialize_number!(deserialize_i16, visit_i16, i16);
    deserialize_number!(deserialize_i32, visit_i32, i32);
    deserialize_number!(deserialize_i64, visit_i64, i64);
    deserialize_number!(deserialize_u8, visit_u8, u8);
    deserialize_number!(deserialize_u16, visit_u16, u16);
    deserialize_number!(deserialize_u32, visit_u32, u32);
    deserialize_number!(deserialize_u64, visit_u64, u64);
    deserialize_number!(deserialize_f32, visit_f32, f32);
    deserialize_number!(deserialize_f64, visit_f64, f64);

    fn deserialize_char<V: Visitor<'a>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.deserialize_str(visitor)
    }

    fn deserialize_str<V: Visitor<'a>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.value {
            Value::String(s) => visitor.visit_borrowed_str(s),
            Value::Number(n) => visitor.visit_string(n.to_string()),
            Value::Bool(b) => visitor.visit_string(b.to_string()),
            _ => Err(self.invalid("string")),
        }
    }

    fn deserialize_string<V: Visitor<'a>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'a>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.deserialize_any(visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'a>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.deserialize_any(visitor)
    }

    fn deserialize_option<V: Visitor<'a>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'a>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            _ => Err(self.invalid("null")),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'a>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'a>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'a>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.value {
            Value::Array(items) => visitor.visit_seq(SeqDeserializer::new(items, self.path)),
            _ => Err(self.invalid("sequence")),
        }
    }

    fn deserialize_tuple<V: Visitor<'a>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'a>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'a>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.value {
            Value::Object(map) => visitor.visit_map(MapDeserializer::new(map, self.path)),
            // cgminer wraps single results in a one-element array
            Value::Array(items) if items.len() == 1 => {
                ValueDeserializer::new(&items[0], format!("{}[0]", self.path))
                    .deserialize_map(visitor)
            }
            _ => Err(self.invalid("map")),
        }
    }

    fn deserialize_struct<V: Visitor<'a>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V: Visitor<'a>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        match self.value {
            Value::String(s) => visitor.visit_enum(BorrowedStrDeserializer::<DecodeError>::new(s)),
            _ => Err(self.invalid("enum variant name")),
        }
    }

    fn deserialize_identifier<V: Visitor<'a>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'a>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        visitor.visit_unit()
    }
}

// =============================================================================
// Sequence and Map Access
// =============================================================================

struct SeqDeserializer<'a> {
    items: std::iter::Enumerate<std::slice::Iter<'a, Value>>,
    path: String,
}

impl<'a> SeqDeserializer<'a> {
    fn new(items: &'a [Value], path: String) -> Self {
        Self {
            items: items.iter().enumerate(),
            path,
        }
    }
}

impl<'a> SeqAccess<'a> for SeqDeserializer<'a> {
    type Error = DecodeError;

    fn next_element_seed<T: DeserializeSeed<'a>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, DecodeError> {
        match self.items.next() {
            Some((index, value)) => {
                let path = format!("{}[{}]", self.path, index);
                seed.deserialize(ValueDeserializer::new(value, path.clone()))
                    .map(Some)
                    .map_err(|e| e.with_path(&path))
            }
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

struct MapDeserializer<'a> {
    entries: serde_json::map::Iter<'a>,
    pending: Option<(&'a str, &'a Value)>,
    path: String,
}

impl<'a> MapDeserializer<'a> {
    fn new(map: &'a Map<String, Value>, path: String) -> Self {
        Self {
            entries: map.iter(),
            pending: None,
            path,
        }
    }
}

impl<'a> MapAccess<'a> for MapDeserializer<'a> {
    type Error = DecodeError;

    fn next_key_seed<K: DeserializeSeed<'a>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, DecodeError> {
        match self.entries.next() {
            Some((key, value)) => {
                self.pending = Some((key.as_str(), value));
                seed.deserialize(BorrowedStrDeserializer::<DecodeError>::new(key))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'a>>(
        &mut self,
        seed: V,
    ) -> Result<V::Value, DecodeError> {
        let (key, value) = self
            .pending
            .take()
            .ok_or_else(|| {
                <DecodeError as de::Error>::custom("map value requested before its key")
            })?;
        let path = child_path(&self.path, key);
        seed.deserialize(ValueDeserializer::new(value, path.clone()))
            .map_err(|e| e.with_path(&path))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Device {
        #[serde(rename = "ID")]
        id: u32,
        #[serde(rename = "Enabled")]
        enabled: bool,
        #[serde(rename = "Temperature")]
        temperature: f64,
        #[serde(rename = "Name", default)]
        name: Option<String>,
    }

    #[test]
    fn test_numbers_and_bools_from_text() {
        let value = json!([{"ID": "3", "Enabled": "Y", "Temperature": "61.25"}]);
        let devices: Vec<Device> = from_value(&value, "DEVS").unwrap();

        assert_eq!(
            devices,
            vec![Device {
                id: 3,
                enabled: true,
                temperature: 61.25,
                name: None,
            }]
        );
    }

    #[test]
    fn test_native_json_types_still_work() {
        let value = json!([{"ID": 0, "Enabled": false, "Temperature": 55, "Name": "BTM"}]);
        let devices: Vec<Device> = from_value(&value, "DEVS").unwrap();

        assert_eq!(devices[0].temperature, 55.0);
        assert_eq!(devices[0].name.as_deref(), Some("BTM"));
    }

    #[test]
    fn test_invalid_value_names_path_and_raw_value() {
        let value = json!([
            {"ID": "0", "Enabled": "Y", "Temperature": "60"},
            {"ID": "1", "Enabled": "Y", "Temperature": "hot"}
        ]);
        let err = from_value::<Vec<Device>>(&value, "DEVS").unwrap_err();

        match err {
            DecodeError::InvalidValue { path, value, expected } => {
                assert_eq!(path, "DEVS[1].Temperature");
                assert_eq!(value, "hot");
                assert_eq!(expected, "f64");
            }
            other => panic!("Expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_field_reports_record() {
        let value = json!([{"ID": "0", "Temperature": "60"}]);
        let err = from_value::<Vec<Device>>(&value, "DEVS").unwrap_err();

        let message = err.to_string();
        assert!(message.contains("Enabled"), "{}", message);
        assert!(message.contains("DEVS[0]"), "{}", message);
    }

    #[test]
    fn test_single_struct_from_one_element_array() {
        let value = json!([{"ID": "7", "Enabled": "N", "Temperature": "0"}]);
        let device: Device = from_value(&value, "DEVS").unwrap();
        assert_eq!(device.id, 7);
        assert!(!device.enabled);
    }

    #[test]
    fn test_integer_rejects_fraction() {
        let value = json!({"ID": "1.5", "Enabled": "Y", "Temperature": "1"});
        assert!(matches!(
            from_value::<Device>(&value, "DEVS"),
            Err(DecodeError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_flattened_fields_see_raw_text() {
        #[derive(Debug, Deserialize)]
        struct Outer {
            #[serde(flatten)]
            _device: Device,
        }

        let value = json!({"ID": "7", "Enabled": "Y", "Temperature": "40"});
        assert!(from_value::<Device>(&value, "DEVS").is_ok());
        assert!(from_value::<Outer>(&value, "DEVS").is_err());
    }
}
