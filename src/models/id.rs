//! Record identifiers
//!
//! Rows in the hosted service are keyed by integers, but callers hand identifiers
//! over as whatever they have at hand: route segments, query strings, numbers.
//! `normalize_id` turns numeric-looking text into an integer so equality filters
//! match integer columns, and passes anything else through untouched.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a remote row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// Integer key
    Int(i64),
    /// Opaque key (uuid, slug-like ids, or text that is not a number)
    Text(String),
}

impl RecordId {
    /// Value as it appears in a PostgREST filter (`id=eq.<value>`).
    pub fn to_filter_value(&self) -> String {
        self.to_string()
    }

    /// JSON representation used in request bodies.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Int(n) => serde_json::Value::from(*n),
            Self::Text(s) => serde_json::Value::from(s.as_str()),
        }
    }

    /// Read an identifier out of a JSON value, if it holds one.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().and_then(integral_f64))
                .map(Self::Int),
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for RecordId {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<u32> for RecordId {
    fn from(value: u32) -> Self {
        Self::Int(value.into())
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&RecordId> for RecordId {
    fn from(value: &RecordId) -> Self {
        value.clone()
    }
}

/// Convert an identifier to an integer when it parses as a number.
///
/// Never fails: text that is not an integral number (`"abc"`, `""`, `"1.5"`)
/// is returned unchanged. This is stricter than plain numeric coercion, which
/// would turn `"1.5"` into the number 1.5: fractional ids stay text, so a
/// procedure call sends them as JSON strings.
pub fn normalize_id(value: impl Into<RecordId>) -> RecordId {
    match value.into() {
        RecordId::Text(text) => match parse_integral(&text) {
            Some(n) => RecordId::Int(n),
            None => RecordId::Text(text),
        },
        id => id,
    }
}

fn parse_integral(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(n);
    }
    // Rust's f64 parser accepts "inf" and "nan"; only plain decimal/exponent text counts
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return None;
    }
    trimmed.parse::<f64>().ok().and_then(integral_f64)
}

fn integral_f64(value: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound
    if value.is_finite()
        && value.fract() == 0.0
        && value >= i64::MIN as f64
        && value < i64::MAX as f64
    {
        Some(value as i64)
    } else {
        None
    }
}
