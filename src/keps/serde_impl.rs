//! Lenient field deserializers for KEP metadata
//!
//! `kep.yaml` files are written by hand, so the same field shows up as a
//! quoted string in one file, a bare number in another, and an empty value
//! in a third. These helpers normalize those shapes.

use chrono::{DateTime, NaiveDate};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Int(i64),
    Float(f64),
}

impl StringOrNumber {
    /// Bare floats are refused: `1.20` would come back as `1.2`
    fn into_string<E: serde::de::Error>(self) -> Result<String, E> {
        match self {
            StringOrNumber::String(s) => Ok(s),
            StringOrNumber::Int(i) => Ok(i.to_string()),
            StringOrNumber::Float(f) => Err(E::custom(format!(
                "unquoted number {} is ambiguous, write it as a quoted string",
                f
            ))),
        }
    }
}

/// Treat an explicit null like a missing field
pub fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept a string or an integer; empty strings become `None`
///
/// Bare versions such as `1.20` must be quoted.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<StringOrNumber>::deserialize(deserializer)?
        .map(StringOrNumber::into_string::<D::Error>)
        .transpose()?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

/// Accept `YYYY-MM-DD` or an RFC 3339 timestamp (date part kept)
pub fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = string_or_number(deserializer)? else {
        return Ok(None);
    };
    parse_date(&raw)
        .map(Some)
        .ok_or_else(|| D::Error::custom(format!("invalid date '{}'", raw)))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.date_naive())
}
