// ABOUTME: Container operations trait for container runtimes.
// ABOUTME: Create, start, stop, remove, inspect, list, and wait for containers.

use super::sealed::Sealed;
use super::shared_types::ContainerConfig;
use crate::types::ContainerId;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Container lifecycle operations.
#[async_trait]
pub trait ContainerOps: Sealed + Send + Sync {
    /// Create a container from the given configuration.
    async fn create_container(
        &self,
        config: &ContainerConfig,
    ) -> Result<ContainerId, ContainerError>;

    /// Start a created container.
    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError>;

    /// Stop a running container.
    async fn stop_container(
        &self,
        id: &ContainerId,
        timeout: Duration,
    ) -> Result<(), ContainerError>;

    /// Remove a container.
    async fn remove_container(&self, id: &ContainerId, force: bool) -> Result<(), ContainerError>;

    /// The engine's inspect document, or `None` if no such container exists.
    async fn inspect_container(&self, id: &ContainerId) -> Result<Option<Value>, ContainerError>;

    /// List containers matching the given filters.
    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError>;

    /// Block until the container exits, returning its exit code.
    async fn wait_container(&self, id: &ContainerId) -> Result<i64, ContainerError>;
}

/// Filters for listing containers.
#[derive(Debug, Clone, Default)]
pub struct ContainerFilters {
    /// Include stopped containers.
    pub all: bool,
    /// Filter by label (key=value).
    pub labels: HashMap<String, String>,
    /// Filter by name (supports partial match).
    pub name: Option<String>,
    /// Filter by the image the container was created from.
    pub ancestor: Option<String>,
    /// Only containers created after this container.
    pub since: Option<String>,
    /// Only containers created before this container.
    pub before: Option<String>,
    /// Return at most this many of the most recent containers.
    pub limit: Option<i32>,
}

impl ContainerFilters {
    /// Every container, running or not.
    pub fn all() -> Self {
        Self {
            all: true,
            ..Default::default()
        }
    }

    /// The engine's `filters` query map.
    pub fn to_filter_map(&self) -> HashMap<String, Vec<String>> {
        let mut filter_map: HashMap<String, Vec<String>> = HashMap::new();

        if let Some(ref name) = self.name {
            filter_map.insert("name".to_string(), vec![name.clone()]);
        }
        if let Some(ref ancestor) = self.ancestor {
            filter_map.insert("ancestor".to_string(), vec![ancestor.clone()]);
        }
        if let Some(ref since) = self.since {
            filter_map.insert("since".to_string(), vec![since.clone()]);
        }
        if let Some(ref before) = self.before {
            filter_map.insert("before".to_string(), vec![before.clone()]);
        }
        for (key, value) in &self.labels {
            filter_map
                .entry("label".to_string())
                .or_default()
                .push(format!("{}={}", key, value));
        }

        filter_map
    }
}

/// Summary information about a container.
#[derive(Debug, Clone)]
pub struct ContainerSummary {
    /// Container ID.
    pub id: ContainerId,
    /// Container name.
    pub name: String,
    /// Image used.
    pub image: String,
    /// Current state.
    pub state: String,
    /// Status message.
    pub status: String,
    /// Labels.
    pub labels: HashMap<String, String>,
}

/// Errors from container operations.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("container not found: {0}")]
    NotFound(String),

    #[error("container already exists: {0}")]
    AlreadyExists(String),

    #[error("container not running: {0}")]
    NotRunning(String),

    #[error("container already running: {0}")]
    AlreadyRunning(String),

    #[error("image not found: {0}")]
    ImageNotFound(String),

    #[error("container in use: {0}")]
    Conflict(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
