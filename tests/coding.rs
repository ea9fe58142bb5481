//! Typed encode/decode integration tests.
//!
//! Covers scalar round-trips at boundary values, enum-by-raw-value coding,
//! the well-known leaf types (timestamps, binary data, URIs), float
//! substitution, and attribute precedence.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use url::Url;

use xmlbind::coding::{
    self, Data, DataDecoding, Decodable, DecodeOptions, Decoder, Encodable, EncodeOptions,
    Encoder, Error, FloatSubstitution, TimestampDecoding, TimestampEncoding,
};

// --- Enum by raw value ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Green,
    Blue,
}

impl Color {
    fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
        }
    }
}

impl Decodable for Color {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        let text = decoder.text();
        match text.as_str() {
            "red" => Ok(Self::Red),
            "green" => Ok(Self::Green),
            "blue" => Ok(Self::Blue),
            _ => Err(decoder.type_mismatch("one of 'red', 'green', 'blue'", &text)),
        }
    }
}

impl Encodable for Color {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.encode_text(self.as_str());
        Ok(())
    }
}

// --- One field of every primitive type, at boundary values ---

#[derive(Debug, PartialEq)]
struct Everything {
    flag: bool,
    tiny: i8,
    short: i16,
    int: i32,
    long: i64,
    utiny: u8,
    ushort: u16,
    uint: u32,
    ulong: u64,
    single: f32,
    double: f64,
    text: String,
    color: Color,
}

impl Everything {
    fn boundary() -> Self {
        Self {
            flag: true,
            tiny: i8::MIN,
            short: i16::MAX,
            int: 0,
            long: i64::MIN,
            utiny: u8::MAX,
            ushort: 0,
            uint: u32::MAX,
            ulong: u64::MAX,
            single: -1.5,
            double: 2.25e300,
            text: "hello & <world>".to_string(),
            color: Color::Blue,
        }
    }
}

impl Decodable for Everything {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        let mut keyed = decoder.keyed::<Self>();
        Ok(Self {
            flag: keyed.decode("flag")?,
            tiny: keyed.decode("tiny")?,
            short: keyed.decode("short")?,
            int: keyed.decode("int")?,
            long: keyed.decode("long")?,
            utiny: keyed.decode("utiny")?,
            ushort: keyed.decode("ushort")?,
            uint: keyed.decode("uint")?,
            ulong: keyed.decode("ulong")?,
            single: keyed.decode("single")?,
            double: keyed.decode("double")?,
            text: keyed.decode("text")?,
            color: keyed.decode("color")?,
        })
    }
}

impl Encodable for Everything {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        let mut keyed = encoder.keyed::<Self>();
        keyed.encode("flag", &self.flag)?;
        keyed.encode("tiny", &self.tiny)?;
        keyed.encode("short", &self.short)?;
        keyed.encode("int", &self.int)?;
        keyed.encode("long", &self.long)?;
        keyed.encode("utiny", &self.utiny)?;
        keyed.encode("ushort", &self.ushort)?;
        keyed.encode("uint", &self.uint)?;
        keyed.encode("ulong", &self.ulong)?;
        keyed.encode("single", &self.single)?;
        keyed.encode("double", &self.double)?;
        keyed.encode("text", &self.text)?;
        keyed.encode("color", &self.color)
    }
}

#[test]
fn test_scalar_roundtrip_boundary_values() {
    let original = Everything::boundary();
    let xml = coding::to_string(&original, "Everything").unwrap();
    let back: Everything = coding::from_str(&xml).unwrap();
    assert_eq!(back, original);
}

#[test]
fn test_unknown_enum_case_is_type_mismatch() {
    let err =
        coding::from_str::<Color>("<c>purple</c>").map(|_| ()).unwrap_err();
    match err {
        Error::TypeMismatch { found, .. } => assert_eq!(found, "purple"),
        other => panic!("expected TypeMismatch, got {other:?}"),
    }
}

// --- Attribute precedence ---

struct Measured {
    width: u32,
}

impl Decodable for Measured {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        Ok(Self {
            width: decoder.keyed::<Self>().decode("width")?,
        })
    }
}

#[test]
fn test_child_element_beats_attribute() {
    let s: Measured = coding::from_str(r#"<Box width="1"><width>2</width></Box>"#).unwrap();
    assert_eq!(s.width, 2);
}

#[test]
fn test_attribute_used_when_no_element() {
    let s: Measured = coding::from_str(r#"<Box width="1"></Box>"#).unwrap();
    assert_eq!(s.width, 1);
}

// --- Timestamps ---

#[derive(Debug, PartialEq)]
struct Stamped {
    at: DateTime<Utc>,
}

impl Decodable for Stamped {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        Ok(Self {
            at: decoder.keyed::<Self>().decode("at")?,
        })
    }
}

impl Encodable for Stamped {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.keyed::<Self>().encode("at", &self.at)
    }
}

fn sample_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 17, 8, 30, 0).unwrap()
}

#[test]
fn test_timestamp_iso8601_default() {
    let value = Stamped { at: sample_time() };
    let xml = coding::to_string(&value, "Stamped").unwrap();
    assert!(xml.contains("<at>2024-05-17T08:30:00Z</at>"));
    let back: Stamped = coding::from_str(&xml).unwrap();
    assert_eq!(back, value);
}

#[test]
fn test_timestamp_epoch_seconds() {
    let encode = EncodeOptions {
        timestamp: TimestampEncoding::SecondsSince1970,
        ..Default::default()
    };
    let decode = DecodeOptions {
        timestamp: TimestampDecoding::SecondsSince1970,
        ..Default::default()
    };
    let value = Stamped { at: sample_time() };
    let xml = coding::to_string_with_options(&value, "Stamped", &encode).unwrap();
    assert!(xml.contains("<at>1715934600</at>"));
    let back: Stamped = coding::from_str_with_options(&xml, &decode).unwrap();
    assert_eq!(back, value);
}

#[test]
fn test_timestamp_epoch_milliseconds() {
    let encode = EncodeOptions {
        timestamp: TimestampEncoding::MillisecondsSince1970,
        ..Default::default()
    };
    let decode = DecodeOptions {
        timestamp: TimestampDecoding::MillisecondsSince1970,
        ..Default::default()
    };
    let value = Stamped { at: sample_time() };
    let xml = coding::to_string_with_options(&value, "Stamped", &encode).unwrap();
    assert!(xml.contains("<at>1715934600000</at>"));
    let back: Stamped = coding::from_str_with_options(&xml, &decode).unwrap();
    assert_eq!(back, value);
}

#[test]
fn test_timestamp_custom_strategy() {
    // Encode as bare years, decode them back. Exercises the
    // caller-supplied conversion hooks on both sides.
    let encode = EncodeOptions {
        timestamp: TimestampEncoding::Custom(Arc::new(|dt, encoder| {
            encoder.encode_text(&dt.format("%Y").to_string());
            Ok(())
        })),
        ..Default::default()
    };
    let decode = DecodeOptions {
        timestamp: TimestampDecoding::Custom(Arc::new(|decoder| {
            let text = decoder.text();
            let year: i32 = text
                .parse()
                .map_err(|_| decoder.data_corrupted(format!("bad year '{text}'")))?;
            Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0)
                .single()
                .ok_or_else(|| decoder.data_corrupted("unrepresentable year"))
        })),
        ..Default::default()
    };
    let value = Stamped { at: sample_time() };
    let xml = coding::to_string_with_options(&value, "Stamped", &encode).unwrap();
    assert!(xml.contains("<at>2024</at>"));
    let back: Stamped = coding::from_str_with_options(&xml, &decode).unwrap();
    assert_eq!(back.at, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
}

#[test]
fn test_timestamp_invalid_text_is_data_corrupted() {
    let err = coding::from_str::<Stamped>("<Stamped><at>yesterday</at></Stamped>").unwrap_err();
    assert!(matches!(err, Error::DataCorrupted { .. }));
}

// --- Binary data ---

#[derive(Debug, PartialEq)]
struct Blob {
    payload: Data,
}

impl Decodable for Blob {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        Ok(Self {
            payload: decoder.keyed::<Self>().decode("payload")?,
        })
    }
}

impl Encodable for Blob {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.keyed::<Self>().encode("payload", &self.payload)
    }
}

#[test]
fn test_data_base64_roundtrip() {
    let value = Blob {
        payload: Data(vec![0, 1, 2, 254, 255]),
    };
    let xml = coding::to_string(&value, "Blob").unwrap();
    assert!(xml.contains("<payload>AAEC/v8=</payload>"));
    let back: Blob = coding::from_str(&xml).unwrap();
    assert_eq!(back, value);
}

#[test]
fn test_data_invalid_base64_is_corrupted() {
    let err = coding::from_str::<Blob>("<Blob><payload>!!!</payload></Blob>").unwrap_err();
    match err {
        Error::DataCorrupted { path, .. } => assert_eq!(path.to_string(), "$.payload"),
        other => panic!("expected DataCorrupted, got {other:?}"),
    }
}

#[test]
fn test_data_custom_hex_decoding() {
    let decode = DecodeOptions {
        data: DataDecoding::Custom(Arc::new(|decoder| {
            let text = decoder.text();
            (0..text.len())
                .step_by(2)
                .map(|i| {
                    u8::from_str_radix(text.get(i..i + 2).unwrap_or_default(), 16)
                        .map_err(|_| decoder.data_corrupted(format!("bad hex '{text}'")))
                })
                .collect::<Result<Vec<u8>, Error>>()
        })),
        ..Default::default()
    };
    let back: Blob =
        coding::from_str_with_options("<Blob><payload>00ff10</payload></Blob>", &decode).unwrap();
    assert_eq!(back.payload, Data(vec![0x00, 0xFF, 0x10]));
}

// --- URIs ---

#[derive(Debug, PartialEq)]
struct Link {
    href: Url,
}

impl Decodable for Link {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        Ok(Self {
            href: decoder.keyed::<Self>().decode("href")?,
        })
    }
}

impl Encodable for Link {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.keyed::<Self>().encode("href", &self.href)
    }
}

#[test]
fn test_url_roundtrip() {
    let value = Link {
        href: Url::parse("https://example.org/path?q=1").unwrap(),
    };
    let xml = coding::to_string(&value, "Link").unwrap();
    let back: Link = coding::from_str(&xml).unwrap();
    assert_eq!(back, value);
}

#[test]
fn test_invalid_url_is_corrupted() {
    let err = coding::from_str::<Link>("<Link><href>not a uri</href></Link>").unwrap_err();
    assert!(matches!(err, Error::DataCorrupted { .. }));
}

// --- Float substitution ---

#[derive(Debug)]
struct Reading {
    value: f64,
}

impl Decodable for Reading {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        Ok(Self {
            value: decoder.keyed::<Self>().decode("value")?,
        })
    }
}

impl Encodable for Reading {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.keyed::<Self>().encode("value", &self.value)
    }
}

fn substitution() -> FloatSubstitution {
    FloatSubstitution {
        positive_infinity: "INF".to_string(),
        negative_infinity: "-INF".to_string(),
        nan: "NaN".to_string(),
    }
}

#[test]
fn test_nonfinite_roundtrip_with_substitution() {
    let encode = EncodeOptions {
        float_substitution: Some(substitution()),
        ..Default::default()
    };
    let decode = DecodeOptions {
        float_substitution: Some(substitution()),
        ..Default::default()
    };
    for (input, check) in [
        (f64::INFINITY, f64::is_infinite as fn(f64) -> bool),
        (f64::NAN, f64::is_nan),
    ] {
        let xml =
            coding::to_string_with_options(&Reading { value: input }, "Reading", &encode).unwrap();
        let back: Reading = coding::from_str_with_options(&xml, &decode).unwrap();
        assert!(check(back.value), "failed for {input}: got {}", back.value);
    }
}

#[test]
fn test_nonfinite_encode_without_substitution_fails() {
    let err = coding::to_string(&Reading { value: f64::NAN }, "Reading").unwrap_err();
    assert!(matches!(err, Error::InvalidFloatValue { .. }));
}

// --- Document-level failures ---

#[test]
fn test_decode_from_malformed_input() {
    let err = coding::from_str::<Color>("<c>red").map(|_| ()).unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
}

#[test]
fn test_decode_from_empty_input() {
    let err = coding::from_str::<Color>("").map(|_| ()).unwrap_err();
    assert!(matches!(err, Error::EmptyDocument));
}
