use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::constants::{BANKING_DATE_FORMATS, READING_TIMESTAMP_FORMATS};
use crate::types::Record;

static CURRENCY_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{3}$").expect("valid currency regex"));

/// First field present under any of the given names
pub fn field<'a>(record: &'a Record, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| record.get(*name))
}

/// Absent or JSON null
pub fn is_null(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// Absent, null, or a string that is empty once trimmed
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// The literal `NA` placeholder used by some feeds for missing readings
pub fn is_na(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(s)) if s.trim().eq_ignore_ascii_case("NA"))
}

/// Finite number from a JSON number or a numeric string. `NA`, empty strings,
/// booleans and containers are not numbers.
pub fn as_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || s.eq_ignore_ascii_case("NA") {
                return None;
            }
            s.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

/// Scalar rendered as text, used for status fields and grouping keys
pub fn text(value: Option<&Value>) -> Option<Cow<'_, str>> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(Cow::Borrowed(s.trim())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        _ => None,
    }
}

/// Case-insensitive comparison of a text field against an expected value
pub fn text_eq(value: Option<&Value>, expected: &str) -> bool {
    text(value).is_some_and(|t| t.eq_ignore_ascii_case(expected))
}

pub fn parse_reading_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    READING_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

pub fn parse_banking_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    BANKING_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Banking date read from a string field; anything else is unparseable
pub fn date_field(value: Option<&Value>) -> Option<NaiveDate> {
    match value? {
        Value::String(s) => parse_banking_date(s),
        _ => None,
    }
}

pub fn is_currency_code(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(s)) if CURRENCY_CODE.is_match(s.trim()))
}
