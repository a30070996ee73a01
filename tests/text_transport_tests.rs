//! Plain-Text Transport Tests
//!
//! Tests for the legacy pipe/comma-delimited format.

use std::io::Cursor;

use cgminer_api::protocol::DecodeError;
use cgminer_api::{CgminerError, Command, PlainTextTransport, StatusCode, Transport};
use serde::Deserialize;

// =============================================================================
// Helper Functions
// =============================================================================

#[derive(Debug, Deserialize, PartialEq, Default)]
struct Summary {
    #[serde(rename = "Elapsed")]
    elapsed: u64,
    #[serde(rename = "MHS av")]
    mhs_av: f64,
}

#[derive(Debug, Deserialize, PartialEq)]
struct Device {
    #[serde(rename = "ASC")]
    asc: u32,
    #[serde(rename = "Enabled")]
    enabled: bool,
    #[serde(rename = "Temperature")]
    temperature: f64,
}

#[derive(Debug, Deserialize, PartialEq)]
struct Record {
    #[serde(rename = "A")]
    a: u32,
    #[serde(rename = "B")]
    b: u32,
}

fn decode<T: serde::de::DeserializeOwned>(
    text: &str,
    command: &Command,
    out: Option<&mut T>,
) -> cgminer_api::Result<()> {
    let mut bytes = text.as_bytes().to_vec();
    bytes.push(0);
    PlainTextTransport.decode_response(&mut Cursor::new(bytes), command, out)
}

const SUMMARY: &str = "STATUS=S,When=1700000000,Code=11,Msg=Summary,Description=cgminer 4.12.0\
    |SUMMARY,Elapsed=90,MHS av=1500.25|";

// =============================================================================
// Request Encoding Tests
// =============================================================================

#[test]
fn test_send_command_without_params() {
    let mut wire = Vec::new();
    PlainTextTransport
        .send_command(&mut wire, &Command::new("summary"))
        .unwrap();
    assert_eq!(wire, b"summary");
}

#[test]
fn test_send_command_with_params() {
    let mut wire = Vec::new();
    let command = Command::new("ascset").with_params(["0", "freq", "650"]);
    PlainTextTransport.send_command(&mut wire, &command).unwrap();
    assert_eq!(wire, b"ascset,0,freq,650");
}

#[test]
fn test_command_round_trip() {
    let command = Command::new("switchpool").with_params(["p1", "p2"]);
    let encoded = PlainTextTransport::encode_command(&command);
    let decoded = PlainTextTransport::decode_command(&encoded).unwrap();

    assert_eq!(decoded, command);
}

// =============================================================================
// Successful Response Tests
// =============================================================================

#[test]
fn test_decode_summary() {
    let mut summary: Vec<Summary> = Vec::new();
    decode(SUMMARY, &Command::new("summary"), Some(&mut summary)).unwrap();

    assert_eq!(
        summary,
        vec![Summary {
            elapsed: 90,
            mhs_av: 1500.25,
        }]
    );
}

#[test]
fn test_decode_single_record_into_struct() {
    let mut summary = Summary::default();
    decode(SUMMARY, &Command::new("summary"), Some(&mut summary)).unwrap();
    assert_eq!(summary.elapsed, 90);
}

#[test]
fn test_decode_multiple_records_in_order() {
    let text = "STATUS=S,Code=9,Msg=3 ASC(s)\
        |ASC=0,Enabled=Y,Temperature=60.5\
        |ASC=1,Enabled=N,Temperature=0\
        |ASC=2,Enabled=Y,Temperature=71|";

    let mut devices: Vec<Device> = Vec::new();
    decode(text, &Command::new("devs"), Some(&mut devices)).unwrap();

    assert_eq!(devices.len(), 3);
    assert_eq!(devices.iter().map(|d| d.asc).collect::<Vec<_>>(), vec![0, 1, 2]);
    assert!(!devices[1].enabled);
    assert_eq!(devices[2].temperature, 71.0);
}

#[test]
fn test_semicolon_section_separator() {
    let text = "STATUS=S,Msg=ok;A=1,B=2;A=3,B=4;";

    let mut records: Vec<Record> = Vec::new();
    decode(text, &Command::new("x"), Some(&mut records)).unwrap();
    assert_eq!(records, vec![Record { a: 1, b: 2 }, Record { a: 3, b: 4 }]);
}

#[test]
fn test_trailing_delimiters_are_equivalent() {
    let mut with_trailing: Vec<Record> = Vec::new();
    let mut without_trailing: Vec<Record> = Vec::new();

    decode("STATUS=S,Msg=ok|A=1,B=2,|", &Command::new("x"), Some(&mut with_trailing)).unwrap();
    decode("STATUS=S,Msg=ok|A=1,B=2", &Command::new("x"), Some(&mut without_trailing)).unwrap();

    assert_eq!(with_trailing, without_trailing);
}

#[test]
fn test_embedded_empty_fields_and_sections() {
    let text = " STATUS=S,,Msg=ok, || A=1 ,, B=2 |||\n";

    let mut records: Vec<Record> = Vec::new();
    decode(text, &Command::new("x"), Some(&mut records)).unwrap();
    assert_eq!(records, vec![Record { a: 1, b: 2 }]);
}

#[test]
fn test_escaped_separators_in_values() {
    #[derive(Deserialize)]
    struct Config {
        #[serde(rename = "Device Code")]
        device_code: String,
    }

    let text = r"STATUS=S,Msg=ok|CONFIG,Device Code=GSD ICA\,OSM\|x|";
    let mut config: Vec<Config> = Vec::new();
    decode(text, &Command::new("config"), Some(&mut config)).unwrap();

    assert_eq!(config[0].device_code, "GSD ICA,OSM|x");
}

#[test]
fn test_status_only_response_leaves_out_unmodified() {
    let mut records = vec![Record { a: 7, b: 7 }];
    decode("STATUS=S,Code=38,Msg=Restart|", &Command::new("restart"), Some(&mut records))
        .unwrap();
    assert_eq!(records, vec![Record { a: 7, b: 7 }]);
}

#[test]
fn test_response_section_named_by_tag() {
    let response = PlainTextTransport
        .parse_response(SUMMARY.as_bytes(), &Command::new("summary").without_result())
        .unwrap();

    assert_eq!(response.section, "SUMMARY");
    assert_eq!(response.status.code, StatusCode::Success);
    assert_eq!(response.status.number, Some(11));
    assert_eq!(response.status.description.as_deref(), Some("cgminer 4.12.0"));
}

// =============================================================================
// Failure Response Tests
// =============================================================================

#[test]
fn test_error_status_is_api_error() {
    let text = "STATUS=E,When=1700000000,Code=14,Msg=Invalid command,Description=cgminer 4.12.0|";

    let mut summary = vec![Summary::default()];
    let err = decode(text, &Command::new("bogus"), Some(&mut summary)).unwrap_err();

    let status = err.api_status().expect("api error");
    assert_eq!(status.code, StatusCode::Error);
    assert_eq!(status.number, Some(14));
    assert_eq!(status.message, "Invalid command");
    assert_eq!(summary, vec![Summary::default()]);
}

#[test]
fn test_error_status_ignores_remaining_sections() {
    let text = "STATUS=E,Msg=nope|this,is,not=parsed,garbage|";
    let err = decode::<Vec<Record>>(text, &Command::new("x"), None).unwrap_err();
    assert!(matches!(err, CgminerError::Api(_)));
}

#[test]
fn test_empty_payload() {
    let err = decode::<Vec<Record>>("  \n", &Command::new("x"), None).unwrap_err();
    assert!(matches!(err, CgminerError::Protocol(_)));
}

#[test]
fn test_status_missing_description() {
    let err = decode::<Vec<Record>>("STATUS=S,Code=1|", &Command::new("x"), None).unwrap_err();
    assert!(matches!(err, CgminerError::Protocol(_)));
}

#[test]
fn test_status_unparseable_field() {
    let err = decode::<Vec<Record>>("STATUS=S,Msg=ok,junk|", &Command::new("x"), None).unwrap_err();
    assert!(matches!(err, CgminerError::Protocol(_)));
}

#[test]
fn test_status_bad_code_number() {
    let err = decode::<Vec<Record>>("STATUS=S,Code=abc,Msg=ok|", &Command::new("x"), None)
        .unwrap_err();
    assert!(matches!(err, CgminerError::Protocol(_)));
}

#[test]
fn test_conversion_failure_names_field_and_value() {
    let text = "STATUS=S,Msg=ok|ASC=0,Enabled=Y,Temperature=60|ASC=1,Enabled=maybe,Temperature=61|";

    let mut devices: Vec<Device> = Vec::new();
    let err = decode(text, &Command::new("devs"), Some(&mut devices)).unwrap_err();

    match err {
        CgminerError::Decode(DecodeError::InvalidValue { path, value, expected }) => {
            assert_eq!(path, "DEVS[1].Enabled");
            assert_eq!(value, "maybe");
            assert_eq!(expected, "bool");
        }
        other => panic!("Expected decode error, got {:?}", other),
    }
    assert!(devices.is_empty());
}

#[test]
fn test_no_silent_default_for_empty_value() {
    let text = "STATUS=S,Msg=ok|A=,B=2|";
    let err = decode::<Vec<Record>>(text, &Command::new("x"), Some(&mut Vec::new())).unwrap_err();
    assert!(matches!(err, CgminerError::Decode(DecodeError::InvalidValue { .. })));
}

#[test]
fn test_invalid_utf8_is_rejected() {
    #[derive(Debug, Deserialize)]
    struct Named {
        #[serde(rename = "Name")]
        _name: String,
    }

    let mut bytes = b"STATUS=S,Msg=ok|DEVS,Name=B\xffTM|".to_vec();
    bytes.push(0);

    let mut named: Vec<Named> = Vec::new();
    let err = PlainTextTransport
        .decode_response(&mut Cursor::new(bytes), &Command::new("devs"), Some(&mut named))
        .unwrap_err();

    assert!(matches!(err, CgminerError::Protocol(_)), "{:?}", err);
    assert!(named.is_empty());
}
