mod common;

use common::self_generated_key;
use keystone_license::{LicenseError, LicenseKey, LicenseKeyDiff, LicenseRecord, WRITEABLE_TYPE};
use std::io::Cursor;

fn sample_key() -> LicenseKey {
    self_generated_key(&LicenseRecord::self_generated("test"))
}

// ── JSON ─────────────────────────────────────────────────────────

#[test]
fn writeable_name_is_license() {
    assert_eq!(sample_key().writeable_name(), "license");
    assert_eq!(WRITEABLE_TYPE, "license");
}

#[test]
fn to_json_shape() {
    let key = sample_key();
    let json = key.to_json();
    assert_eq!(json["license"]["licenseKey"], key.to_text());
    assert_eq!(json.as_object().unwrap().len(), 1);
}

#[test]
fn json_roundtrip() {
    let key = sample_key();
    let bytes = serde_json::to_vec(&key.to_json()).unwrap();
    let (parsed, consumed) = LicenseKey::from_json_stream(&bytes).unwrap();
    assert_eq!(parsed, key);
    assert_eq!(consumed, bytes.len());
}

#[test]
fn json_stream_stops_after_own_object() {
    let key = sample_key();
    let first = serde_json::to_string(&key.to_json()).unwrap();
    let packed = format!("{first}{{\"other\":{{\"x\":1}}}}");

    let (parsed, consumed) = LicenseKey::from_json_stream(packed.as_bytes()).unwrap();
    assert_eq!(parsed, key);
    assert_eq!(consumed, first.len());
    assert_eq!(&packed[consumed..], r#"{"other":{"x":1}}"#);
}

#[test]
fn json_stream_accepts_surrounding_whitespace() {
    let key = sample_key();
    let text = format!("  {}  ", serde_json::to_string(&key.to_json()).unwrap());
    let (parsed, _) = LicenseKey::from_json_stream(text.as_bytes()).unwrap();
    assert_eq!(parsed, key);
}

#[test]
fn json_unknown_field_is_rejected() {
    let text = r#"{"license":{"licenseKey":"AAAA","seats":3}}"#;
    let err = LicenseKey::from_json_stream(text.as_bytes()).unwrap_err();
    assert!(matches!(err, LicenseError::MetadataParsing(_)));
}

#[test]
fn json_wrong_object_name_is_rejected() {
    let text = r#"{"licence":{"licenseKey":"AAAA"}}"#;
    assert!(matches!(
        LicenseKey::from_json_stream(text.as_bytes()),
        Err(LicenseError::MetadataParsing(_))
    ));
}

#[test]
fn json_missing_key_is_rejected() {
    assert!(LicenseKey::from_json_stream(br#"{"license":{}}"#).is_err());
}

#[test]
fn json_invalid_base64_is_rejected() {
    let text = r#"{"license":{"licenseKey":"***"}}"#;
    assert!(matches!(
        LicenseKey::from_json_stream(text.as_bytes()),
        Err(LicenseError::MetadataParsing(_))
    ));
}

#[test]
fn json_empty_input_is_rejected() {
    assert!(matches!(
        LicenseKey::from_json_stream(b"   "),
        Err(LicenseError::MetadataParsing(_))
    ));
}

// ── Binary ───────────────────────────────────────────────────────

#[test]
fn binary_roundtrip() {
    let key = sample_key();
    let mut buf = Vec::new();
    key.write_to(&mut buf).unwrap();
    assert_eq!(buf.len(), 4 + key.as_bytes().len());

    let parsed = LicenseKey::read_from(&mut Cursor::new(buf)).unwrap();
    assert_eq!(parsed, key);
}

#[test]
fn binary_consecutive_keys() {
    let a = sample_key();
    let b = self_generated_key(&LicenseRecord::self_generated("other"));
    let mut buf = Vec::new();
    a.write_to(&mut buf).unwrap();
    b.write_to(&mut buf).unwrap();

    let mut cursor = Cursor::new(buf);
    assert_eq!(LicenseKey::read_from(&mut cursor).unwrap(), a);
    assert_eq!(LicenseKey::read_from(&mut cursor).unwrap(), b);
}

#[test]
fn binary_truncated_is_io_error() {
    let mut buf = Vec::new();
    sample_key().write_to(&mut buf).unwrap();
    buf.truncate(buf.len() - 3);
    assert!(matches!(
        LicenseKey::read_from(&mut Cursor::new(buf)),
        Err(LicenseError::Io(_))
    ));
}

#[test]
fn binary_negative_length_is_rejected() {
    let buf = (-5i32).to_be_bytes().to_vec();
    assert!(matches!(
        LicenseKey::read_from(&mut Cursor::new(buf)),
        Err(LicenseError::MetadataParsing(_))
    ));
}

#[test]
fn binary_oversized_length_is_rejected() {
    let buf = i32::MAX.to_be_bytes().to_vec();
    assert!(matches!(
        LicenseKey::read_from(&mut Cursor::new(buf)),
        Err(LicenseError::MetadataParsing(_))
    ));
}

// ── Diffs ────────────────────────────────────────────────────────

#[test]
fn diff_against_same_key() {
    let key = sample_key();
    assert_eq!(key.diff(Some(&key.clone())), LicenseKeyDiff::Same);
}

#[test]
fn diff_against_absent_or_other_key() {
    let key = sample_key();
    let other = self_generated_key(&LicenseRecord::self_generated("other"));
    assert_eq!(key.diff(None), LicenseKeyDiff::Complete(key.clone()));
    assert_eq!(key.diff(Some(&other)), LicenseKeyDiff::Complete(key.clone()));
}

#[test]
fn diff_apply() {
    let key = sample_key();
    let other = self_generated_key(&LicenseRecord::self_generated("other"));

    assert_eq!(LicenseKeyDiff::Same.apply(Some(other.clone())), Some(other.clone()));
    assert_eq!(LicenseKeyDiff::Same.apply(None), None);
    assert_eq!(key.diff(Some(&other)).apply(Some(other)), Some(key));
}

#[test]
fn diff_binary_roundtrip() {
    let key = sample_key();
    for diff in [LicenseKeyDiff::Same, LicenseKeyDiff::Complete(key)] {
        let mut buf = Vec::new();
        diff.write_to(&mut buf).unwrap();
        let parsed = LicenseKeyDiff::read_from(&mut Cursor::new(buf)).unwrap();
        assert_eq!(parsed, diff);
    }
}

#[test]
fn diff_unknown_tag_is_rejected() {
    assert!(matches!(
        LicenseKeyDiff::read_from(&mut Cursor::new(vec![9u8])),
        Err(LicenseError::MetadataParsing(_))
    ));
}
