// ABOUTME: Runtime info trait for container runtimes.
// ABOUTME: Query engine version, server info, and connectivity.

use super::sealed::Sealed;
use super::shared_types::RuntimeVersion;
use async_trait::async_trait;
use serde_json::Value;

/// Runtime metadata operations.
#[async_trait]
pub trait RuntimeInfo: Sealed + Send + Sync {
    /// Engine and API version.
    async fn version(&self) -> Result<RuntimeVersion, RuntimeInfoError>;

    /// The engine's system-wide information document.
    async fn info(&self) -> Result<Value, RuntimeInfoError>;

    /// Ping the runtime to check connectivity.
    async fn ping(&self) -> Result<(), RuntimeInfoError>;
}

/// Errors from runtime info operations.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeInfoError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
