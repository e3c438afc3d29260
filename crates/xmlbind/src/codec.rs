//! Primitive codec: scalar values to and from their XML text form.
//!
//! All functions here are pure. XML escaping is the document writer's job;
//! strings pass through untouched.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ScalarError;

/// Canonical lexical form used when encoding timestamps.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// The primitive kinds a field can be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    String,
    Integer,
    Double,
    Boolean,
    Timestamp,
}

impl PrimitiveKind {
    /// Maps a schema type name to a primitive kind.
    ///
    /// An `xsd:` or `xs:` prefix is ignored. Returns `None` for names that do
    /// not denote a primitive, which schema assembly then treats as a
    /// reference to a record type.
    pub fn from_type_name(name: &str) -> Option<Self> {
        let bare = name
            .strip_prefix("xsd:")
            .or_else(|| name.strip_prefix("xs:"))
            .unwrap_or(name);
        match bare {
            "string" => Some(PrimitiveKind::String),
            "integer" | "int" | "long" => Some(PrimitiveKind::Integer),
            "double" | "float" | "decimal" => Some(PrimitiveKind::Double),
            "boolean" => Some(PrimitiveKind::Boolean),
            "dateTime" | "timestamp" => Some(PrimitiveKind::Timestamp),
            _ => None,
        }
    }

    /// Name used in error messages and schema definitions.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Integer => "integer",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Timestamp => "dateTime",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded primitive value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    String(String),
    Integer(i64),
    Double(f64),
    Boolean(bool),
    Timestamp(NaiveDateTime),
}

impl Scalar {
    /// The kind this value belongs to.
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Scalar::String(_) => PrimitiveKind::String,
            Scalar::Integer(_) => PrimitiveKind::Integer,
            Scalar::Double(_) => PrimitiveKind::Double,
            Scalar::Boolean(_) => PrimitiveKind::Boolean,
            Scalar::Timestamp(_) => PrimitiveKind::Timestamp,
        }
    }
}

/// Encodes a scalar into its XML text representation.
pub fn encode(value: &Scalar) -> String {
    match value {
        Scalar::String(s) => s.clone(),
        Scalar::Integer(i) => i.to_string(),
        Scalar::Double(d) => encode_double(*d),
        Scalar::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
        Scalar::Timestamp(ts) => encode_timestamp(ts),
    }
}

/// Decodes XML text as the given kind.
pub fn decode(kind: PrimitiveKind, text: &str) -> Result<Scalar, ScalarError> {
    let trimmed = text.trim_matches(|c| matches!(c, ' ' | '\t' | '\r' | '\n'));

    match kind {
        PrimitiveKind::String => Ok(Scalar::String(text.to_string())),
        _ if trimmed.is_empty() => Err(ScalarError::new(kind, text, "empty text")),
        PrimitiveKind::Integer => trimmed
            .parse::<i64>()
            .map(Scalar::Integer)
            .map_err(|e| ScalarError::new(kind, text, e)),
        PrimitiveKind::Double => decode_double(trimmed)
            .map(Scalar::Double)
            .ok_or_else(|| ScalarError::new(kind, text, "not a decimal or floating point number")),
        PrimitiveKind::Boolean => match trimmed {
            "true" | "1" => Ok(Scalar::Boolean(true)),
            "false" | "0" => Ok(Scalar::Boolean(false)),
            _ => Err(ScalarError::new(kind, text, "expected true, false, 1 or 0")),
        },
        PrimitiveKind::Timestamp => decode_timestamp(trimmed)
            .map(Scalar::Timestamp)
            .ok_or_else(|| ScalarError::new(kind, text, "not an ISO-8601 date-time")),
    }
}

fn encode_double(d: f64) -> String {
    if d.is_nan() {
        "NaN".to_string()
    } else if d.is_infinite() {
        if d > 0.0 { "INF" } else { "-INF" }.to_string()
    } else {
        // Display gives the shortest text that parses back to the same bits.
        d.to_string()
    }
}

fn decode_double(text: &str) -> Option<f64> {
    match text {
        "INF" | "+INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        // Rust also accepts "inf"/"infinity"/"nan"; xsd does not.
        _ if text.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => None,
        _ => text.parse::<f64>().ok(),
    }
}

fn encode_timestamp(ts: &NaiveDateTime) -> String {
    if ts.nanosecond() == 0 {
        ts.format(TIMESTAMP_FORMAT).to_string()
    } else {
        ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
    }
}

fn decode_timestamp(text: &str) -> Option<NaiveDateTime> {
    if let Ok(ts) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ts);
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(ts);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
