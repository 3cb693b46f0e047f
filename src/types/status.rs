// ABOUTME: Container status as reported by the engine.
// ABOUTME: Adds a NotFound variant so missing containers are a status, not an error.

use serde::{Serialize, Serializer};
use std::fmt;

/// Lifecycle status of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerStatus {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
    /// The engine has no container with the requested ID.
    NotFound,
}

impl ContainerStatus {
    /// Parse the engine's `State.Status` word. Podman's extra words
    /// (`stopping`, `stopped`, `configured`, ...) map to the nearest Docker
    /// state. Words neither engine documents are logged and read as exited.
    pub fn from_engine(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "created" | "configured" | "initialized" => ContainerStatus::Created,
            "running" => ContainerStatus::Running,
            "paused" => ContainerStatus::Paused,
            "restarting" => ContainerStatus::Restarting,
            "removing" | "stopping" => ContainerStatus::Removing,
            "exited" | "stopped" => ContainerStatus::Exited,
            "dead" => ContainerStatus::Dead,
            "" | "not found" => ContainerStatus::NotFound,
            other => {
                tracing::debug!("unknown container status {:?}, treating as exited", other);
                ContainerStatus::Exited
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerStatus::Created => "created",
            ContainerStatus::Running => "running",
            ContainerStatus::Paused => "paused",
            ContainerStatus::Restarting => "restarting",
            ContainerStatus::Removing => "removing",
            ContainerStatus::Exited => "exited",
            ContainerStatus::Dead => "dead",
            ContainerStatus::NotFound => "not found",
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, ContainerStatus::Running)
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ContainerStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
