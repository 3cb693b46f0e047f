// ABOUTME: Flattened projections of the engine's container and image documents.
// ABOUTME: Raw attrs stay serde_json::Value; records pick out the fields people read.

mod container;
mod image;
mod index;

pub use container::ContainerRecord;
pub use image::ImageRecord;
pub use index::{group_by, index_by};

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;

/// Display format for creation timestamps.
pub const CREATED_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Render an engine timestamp as `%Y-%m-%d %H:%M` in UTC.
///
/// Accepts RFC 3339 strings (with up to nanosecond precision) and Unix
/// seconds. Anything else is returned verbatim.
pub(crate) fn format_created(value: &Value) -> Option<String> {
    match value {
        Value::String(raw) => Some(
            DateTime::parse_from_rfc3339(raw)
                .map(|t| t.with_timezone(&Utc).format(CREATED_FORMAT).to_string())
                .unwrap_or_else(|_| raw.clone()),
        ),
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .map(|t| t.format(CREATED_FORMAT).to_string()),
        _ => None,
    }
}

pub(crate) fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// A string or array-of-strings field as a list.
pub(crate) fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

pub(crate) fn string_map(value: Option<&Value>) -> BTreeMap<String, String> {
    value
        .and_then(Value::as_object)
        .map(|labels| {
            labels
                .iter()
                .map(|(k, v)| {
                    let v = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
                    (k.clone(), v)
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn created_from_nanosecond_timestamp() {
        let created = format_created(&json!("2024-01-15T10:30:45.123456789Z"));
        assert_eq!(created.as_deref(), Some("2024-01-15 10:30"));
    }

    #[test]
    fn created_with_offset_is_converted_to_utc() {
        let created = format_created(&json!("2024-01-15T10:30:45.123456+02:00"));
        assert_eq!(created.as_deref(), Some("2024-01-15 08:30"));
    }

    #[test]
    fn created_from_unix_seconds() {
        let created = format_created(&json!(1_705_314_645));
        assert_eq!(created.as_deref(), Some("2024-01-15 10:30"));
    }

    #[test]
    fn unparseable_created_is_kept() {
        let created = format_created(&json!("last tuesday"));
        assert_eq!(created.as_deref(), Some("last tuesday"));
        assert_eq!(format_created(&Value::Null), None);
    }

    #[test]
    fn string_list_accepts_scalar() {
        assert_eq!(string_list(Some(&json!("/bin/sh"))), vec!["/bin/sh"]);
        assert!(string_list(Some(&Value::Null)).is_empty());
    }
}
