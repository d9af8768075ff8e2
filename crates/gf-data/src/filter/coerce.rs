//! Value coercion for clause comparison
//!
//! A clause compares the row's value against the clause value as numbers when
//! both are numeric, else as timestamps when both are dates, else as
//! lower-cased text.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use gf_core::CellValue;

/// A pair member after coercion
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    Number(f64),
    /// Epoch milliseconds
    Timestamp(i64),
    /// Lower-cased text, `None` when the value has no text form
    Text(Option<String>),
}

impl Coerced {
    /// Ordering between two coerced values of the same kind.
    ///
    /// `None` when the kinds differ or either side has no text form.
    pub fn partial_compare(&self, other: &Coerced) -> Option<Ordering> {
        match (self, other) {
            (Coerced::Number(a), Coerced::Number(b)) => a.partial_cmp(b),
            (Coerced::Timestamp(a), Coerced::Timestamp(b)) => Some(a.cmp(b)),
            (Coerced::Text(Some(a)), Coerced::Text(Some(b))) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// Numeric form of a value
pub fn to_number(value: Option<&CellValue>) -> Option<f64> {
    match value? {
        CellValue::Null => None,
        CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        CellValue::Number(n) => (!n.is_nan()).then_some(*n),
        CellValue::Text(text) => parse_number(text),
    }
}

fn parse_number(text: &str) -> Option<f64> {
    if text.chars().all(|c| c == ' ') {
        return None;
    }
    let trimmed = text.trim();
    if trimmed.is_empty() {
        // Whitespace other than spaces coerces to zero
        return Some(0.0);
    }
    if let Some(value) = parse_radix_integer(trimmed) {
        return Some(value);
    }
    let parsed = match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        // Rust spellings that are not numbers in a grid
        _ if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => return None,
        _ => trimmed.parse::<f64>().ok()?,
    };
    (!parsed.is_nan()).then_some(parsed)
}

/// Unsigned `0x`, `0o` and `0b` integer literals
fn parse_radix_integer(text: &str) -> Option<f64> {
    let (radix, digits) = match text.get(..2)? {
        "0x" | "0X" => (16, &text[2..]),
        "0o" | "0O" => (8, &text[2..]),
        "0b" | "0B" => (2, &text[2..]),
        _ => return None,
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u128::from_str_radix(digits, radix).ok().map(|n| n as f64)
}

/// Check if a value can be compared as a number
pub fn is_valid_number(value: Option<&CellValue>) -> bool {
    to_number(value).is_some()
}

/// Timestamp (epoch milliseconds) of a value
///
/// Numbers are taken as epoch milliseconds. Text is tried as RFC 3339, then
/// RFC 2822, then each of `formats` as a date-time and as a plain date.
pub fn to_timestamp(value: Option<&CellValue>, formats: &[String]) -> Option<i64> {
    match value? {
        CellValue::Number(n) if n.is_finite() => Some(*n as i64),
        CellValue::Text(text) => parse_timestamp(text.trim(), formats),
        _ => None,
    }
}

fn parse_timestamp(text: &str, formats: &[String]) -> Option<i64> {
    if text.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.timestamp_millis());
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(text) {
        return Some(parsed.timestamp_millis());
    }
    formats.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(text, format)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(text, format)
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
            .map(|datetime| datetime.and_utc().timestamp_millis())
    })
}

/// Check if a value can be compared as a date
pub fn is_valid_date(value: Option<&CellValue>, formats: &[String]) -> bool {
    to_timestamp(value, formats).is_some()
}

/// Lower-cased text form of a value
pub fn to_lower_text(value: Option<&CellValue>) -> Option<String> {
    value.and_then(CellValue::to_text).map(|text| text.to_lowercase())
}

/// Coerce an actual/expected pair to a common kind
pub fn coerce_pair(
    actual: Option<&CellValue>,
    expected: Option<&CellValue>,
    date_formats: &[String],
) -> (Coerced, Coerced) {
    if let (Some(a), Some(e)) = (to_number(actual), to_number(expected)) {
        return (Coerced::Number(a), Coerced::Number(e));
    }
    if let (Some(a), Some(e)) = (
        to_timestamp(actual, date_formats),
        to_timestamp(expected, date_formats),
    ) {
        return (Coerced::Timestamp(a), Coerced::Timestamp(e));
    }
    (
        Coerced::Text(to_lower_text(actual)),
        Coerced::Text(to_lower_text(expected)),
    )
}
