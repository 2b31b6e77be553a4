//! Default values and lenient field parsers used by serde for settings deserialization.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub fn default_log_directory() -> String {
    ".".to_string()
}

/// Read a JSON value as a string, treating any non-string value as absent.
pub fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

/// Read a byte count given either as a JSON number or a numeric string.
pub fn u64_or_numeric_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| D::Error::custom(format!("expected a non-negative integer, got {n}"))),
        Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|e| D::Error::custom(format!("invalid byte count '{s}': {e}"))),
        Value::Null => Ok(0),
        other => Err(D::Error::custom(format!(
            "expected a byte count, got {other}"
        ))),
    }
}
