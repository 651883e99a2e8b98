//! Lenient numeric decoding for loosely-typed backend payloads.
//!
//! Field sensors and the prediction pipeline emit numbers, numeric strings,
//! or garbage interchangeably. These helpers coerce the way the dashboard
//! always has: numbers pass through, numeric strings parse, everything else
//! is treated as absent.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::Stage;

/// Interpret a JSON value as a number if it is one, or parses as one.
#[must_use]
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Render a loosely-typed scalar as its display string.
#[must_use]
pub fn as_display_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Deserialize an optional numeric field leniently.
///
/// # Errors
///
/// Only if the underlying deserializer fails; unparseable values map to
/// `None` rather than erroring.
pub fn option_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(as_f64))
}

/// Deserialize an optional stage field, tolerating any numeric wire form.
///
/// # Errors
///
/// Only if the underlying deserializer fails.
pub fn option_stage<'de, D>(deserializer: D) -> Result<Option<Stage>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let stage = value
        .as_ref()
        .and_then(as_f64)
        .map(|n| Stage::from_u8(n as u8));
    Ok(stage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_and_numeric_strings_parse() {
        assert_eq!(as_f64(&json!(30)), Some(30.0));
        assert_eq!(as_f64(&json!(30.5)), Some(30.5));
        assert_eq!(as_f64(&json!("30")), Some(30.0));
        assert_eq!(as_f64(&json!(" 1012.4 ")), Some(1012.4));
    }

    #[test]
    fn garbage_is_absent() {
        assert_eq!(as_f64(&json!("bad")), None);
        assert_eq!(as_f64(&json!(null)), None);
        assert_eq!(as_f64(&json!([1, 2])), None);
        assert_eq!(as_f64(&json!({"v": 1})), None);
    }

    #[test]
    fn display_strings_keep_wire_precision() {
        assert_eq!(as_display_string(&json!("18.72")), Some("18.72".into()));
        assert_eq!(as_display_string(&json!(-62.4)), Some("-62.4".into()));
        assert_eq!(as_display_string(&json!(null)), None);
    }
}
