//! Lenient codecs for Baserow cell values.
//!
//! Baserow returns decimal columns as text (`"120.50"`), text columns may be
//! `null`, and sample columns are text typed by hand. These helpers turn such
//! cells into typed values with explicit defaults.

use chrono::NaiveDate;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

use crate::geometry::parse_sample;

/// Number or numeric text; `null`, blank and non-numeric text read as 0.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_sample(&value).unwrap_or(0.0))
}

/// Text cell; `null` reads as empty.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!("expected text, got {}", other))),
    }
}

/// Sample cell: number, numeric text, or blank.
pub fn deserialize_sample<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_sample(&value))
}

/// Samples are stored in text columns; absent samples are written as `""`.
pub fn serialize_sample<S>(sample: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_sample(*sample))
}

/// Patch form of [`serialize_sample`]; only called for `Some` (outer) values.
pub fn serialize_patch_sample<S>(
    sample: &Option<Option<f64>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_sample(sample.flatten()))
}

/// Render a sample the way it is stored.
pub fn format_sample(sample: Option<f64>) -> String {
    match sample {
        Some(v) => v.to_string(),
        None => String::new(),
    }
}

fn value_to_sample(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_sample(s),
        _ => None,
    }
}

/// Date cell: `YYYY-MM-DD`, optionally followed by a time part.
pub fn deserialize_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => parse_date(&s)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid value for 'Date': '{}'", s))),
        other => Err(D::Error::custom(format!(
            "invalid value for 'Date': '{}'",
            other
        ))),
    }
}

/// Dates are written as `YYYY-MM-DD`; `None` is written as `null`.
pub fn serialize_date<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match date {
        Some(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
        None => serializer.serialize_none(),
    }
}

/// Patch form of [`serialize_date`].
pub fn serialize_patch_date<S>(
    date: &Option<Option<NaiveDate>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serialize_date(&date.flatten(), serializer)
}

/// Parse a date, ignoring any time suffix.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let day = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}
