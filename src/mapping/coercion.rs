// Coercion of stored attribute strings into typed scalar values

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::framework::view_model::ScalarValue;
use crate::framework::view_model_schema::ScalarType;

/// Convert `raw` into `target`, or `None` when the text is not a valid value of that type.
pub fn coerce(raw: &str, target: ScalarType) -> Option<ScalarValue> {
    match target {
        ScalarType::String => Some(ScalarValue::String(raw.to_string())),
        ScalarType::Int => raw.trim().parse::<i64>().ok().map(ScalarValue::Int),
        ScalarType::Float => raw.trim().parse::<f64>().ok().map(ScalarValue::Float),
        ScalarType::Bool => parse_bool(raw).map(ScalarValue::Bool),
        ScalarType::DateTime => parse_datetime(raw).map(ScalarValue::DateTime),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(value) = DateTime::parse_from_rfc3339(raw) {
        return Some(value.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M:%S"] {
        if let Ok(value) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(value.and_utc());
        }
    }
    for format in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0).map(|value| value.and_utc());
        }
    }
    None
}
