// ABOUTME: ContainerRecord, the flat view of a container inspect document.
// ABOUTME: Reads Config, State and NetworkSettings without depending on typed models.

use super::{format_created, str_field, string_list, string_map};
use crate::types::{ContainerStatus, short_id};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// The fields of a container worth looking at, flattened out of the
/// engine's nested inspect document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerRecord {
    pub args: Vec<String>,
    pub created: String,
    pub entrypoint: Vec<String>,
    pub env: Vec<String>,
    pub id: String,
    pub id_short: String,
    pub image: String,
    pub labels: BTreeMap<String, String>,
    /// Name without the engine's leading `/`.
    pub name: String,
    /// `port/proto` mapped to its `host_ip:host_port` bindings (empty when
    /// exposed but unpublished).
    pub ports: BTreeMap<String, Vec<String>>,
    pub status: ContainerStatus,
    /// Mount points declared by the image or the create call.
    pub volumes: Vec<String>,
    pub working_dir: String,
}

impl ContainerRecord {
    /// Flatten an inspect document. `None` for a null or empty document.
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let object = raw.as_object()?;
        if object.is_empty() {
            return None;
        }

        let id = str_field(raw, "Id").unwrap_or_default();
        let config = raw.get("Config").cloned().unwrap_or(Value::Null);
        let status = raw
            .get("State")
            .and_then(|s| s.get("Status"))
            .and_then(Value::as_str)
            .map(ContainerStatus::from_engine)
            .unwrap_or(ContainerStatus::NotFound);

        Some(ContainerRecord {
            args: string_list(raw.get("Args")),
            created: raw.get("Created").and_then(format_created).unwrap_or_default(),
            entrypoint: string_list(config.get("Entrypoint")),
            env: string_list(config.get("Env")),
            id_short: short_id(&id).to_string(),
            id,
            image: str_field(&config, "Image").unwrap_or_default(),
            labels: string_map(config.get("Labels")),
            name: str_field(raw, "Name")
                .map(|n| n.trim_start_matches('/').to_string())
                .unwrap_or_default(),
            ports: parse_ports(raw.get("NetworkSettings").and_then(|n| n.get("Ports"))),
            status,
            volumes: parse_volumes(config.get("Volumes")),
            working_dir: str_field(&config, "WorkingDir").unwrap_or_default(),
        })
    }
}

fn parse_ports(value: Option<&Value>) -> BTreeMap<String, Vec<String>> {
    let Some(ports) = value.and_then(Value::as_object) else {
        return BTreeMap::new();
    };

    ports
        .iter()
        .map(|(port, bindings)| {
            let bound = bindings
                .as_array()
                .map(|list| {
                    list.iter()
                        .map(|b| {
                            format!(
                                "{}:{}",
                                b.get("HostIp").and_then(Value::as_str).unwrap_or(""),
                                b.get("HostPort").and_then(Value::as_str).unwrap_or("")
                            )
                        })
                        .collect()
                })
                .unwrap_or_default();
            (port.clone(), bound)
        })
        .collect()
}

// Docker reports volumes as an object keyed by mount point; some Podman
// versions send a plain list.
fn parse_volumes(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Object(map)) => map.keys().cloned().collect(),
        other => string_list(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn inspect_doc() -> Value {
        json!({
            "Id": "3f4e5d6c7b8a9f0e1d2c3b4a5f6e7d8c9b0a1f2e3d4c5b6a7f8e9d0c1b2a3f4e",
            "Created": "2024-03-02T14:05:09.987654321Z",
            "Name": "/hello_world",
            "Args": ["-c", "echo hi"],
            "Config": {
                "Image": "hello-world:latest",
                "Entrypoint": ["/bin/sh"],
                "Env": ["PATH=/usr/bin"],
                "Labels": {"app": "demo"},
                "Volumes": {"/data": {}},
                "WorkingDir": "/srv"
            },
            "State": {"Status": "exited"},
            "NetworkSettings": {
                "Ports": {
                    "80/tcp": [{"HostIp": "0.0.0.0", "HostPort": "8080"}],
                    "443/tcp": null
                }
            }
        })
    }

    #[test]
    fn flattens_inspect_document() {
        let record = ContainerRecord::from_raw(&inspect_doc()).unwrap();

        assert_eq!(record.id_short, "3f4e5d6c7b8a");
        assert_eq!(record.created, "2024-03-02 14:05");
        assert_eq!(record.name, "hello_world");
        assert_eq!(record.image, "hello-world:latest");
        assert_eq!(record.entrypoint, vec!["/bin/sh"]);
        assert_eq!(record.args, vec!["-c", "echo hi"]);
        assert_eq!(record.labels.get("app").map(String::as_str), Some("demo"));
        assert_eq!(record.status, ContainerStatus::Exited);
        assert_eq!(record.volumes, vec!["/data"]);
        assert_eq!(record.working_dir, "/srv");
        assert_eq!(record.ports["80/tcp"], vec!["0.0.0.0:8080"]);
        assert!(record.ports["443/tcp"].is_empty());
    }

    #[test]
    fn empty_document_is_none() {
        assert!(ContainerRecord::from_raw(&json!({})).is_none());
        assert!(ContainerRecord::from_raw(&Value::Null).is_none());
    }

    #[test]
    fn volumes_as_list() {
        let mut doc = inspect_doc();
        doc["Config"]["Volumes"] = json!(["/a", "/b"]);
        let record = ContainerRecord::from_raw(&doc).unwrap();
        assert_eq!(record.volumes, vec!["/a", "/b"]);
    }

    #[test]
    fn null_config_fields_default() {
        let doc = json!({
            "Id": "abc",
            "Created": "not a date",
            "Config": {"Entrypoint": null, "Labels": null},
            "State": {"Status": "running"}
        });
        let record = ContainerRecord::from_raw(&doc).unwrap();
        assert_eq!(record.id_short, "abc");
        assert_eq!(record.created, "not a date");
        assert!(record.entrypoint.is_empty());
        assert!(record.labels.is_empty());
        assert!(record.status.is_running());
    }
}
