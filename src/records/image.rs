// ABOUTME: ImageRecord, the flat view of an image inspect document or list summary.
// ABOUTME: Keeps the raw attrs alongside id, short id, tags and labels.

use super::{format_created, str_field, string_list, string_map};
use crate::types::short_id;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRecord {
    pub id: String,
    pub short_id: String,
    /// Repository tags, e.g. `hello-world:latest`.
    pub tags: Vec<String>,
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    /// The engine's document, unmodified.
    #[serde(skip)]
    pub attrs: Value,
}

impl ImageRecord {
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let object = raw.as_object()?;
        if object.is_empty() {
            return None;
        }

        let id = str_field(raw, "Id").unwrap_or_default();

        // List summaries carry Labels at the top; inspect documents under Config.
        let labels = match raw.get("Labels") {
            Some(Value::Object(_)) => string_map(raw.get("Labels")),
            _ => string_map(raw.get("Config").and_then(|c| c.get("Labels"))),
        };

        Some(ImageRecord {
            short_id: short_id(&id).to_string(),
            id,
            tags: string_list(raw.get("RepoTags"))
                .into_iter()
                .filter(|t| t != "<none>:<none>")
                .collect(),
            labels,
            architecture: str_field(raw, "Architecture"),
            os: str_field(raw, "Os"),
            size: raw.get("Size").and_then(Value::as_u64),
            created: raw.get("Created").and_then(format_created),
            attrs: raw.clone(),
        })
    }
}
