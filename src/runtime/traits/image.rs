// ABOUTME: Image operations trait for container runtimes.
// ABOUTME: Pull, push, build, inspect, list, and remove container images.

use super::sealed::Sealed;
use super::shared_types::{BuildLog, RegistryAuth};
use crate::types::ImageRef;
use async_trait::async_trait;
use serde_json::Value;

/// Image operations: pull, push, build, inspect, remove.
#[async_trait]
pub trait ImageOps: Sealed + Send + Sync {
    /// Pull an image from a registry.
    async fn pull_image(
        &self,
        reference: &ImageRef,
        auth: Option<&RegistryAuth>,
    ) -> Result<(), ImageError>;

    /// Push a local image to its registry.
    async fn push_image(
        &self,
        reference: &ImageRef,
        auth: Option<&RegistryAuth>,
    ) -> Result<(), ImageError>;

    /// Build an image from a tar'd build context and tag it.
    async fn build_image(
        &self,
        context: Vec<u8>,
        tag: &ImageRef,
        dockerfile: &str,
    ) -> Result<Vec<BuildLog>, ImageError>;

    /// The engine's inspect document, or `None` if the image is not present.
    async fn inspect_image(&self, reference: &ImageRef) -> Result<Option<Value>, ImageError>;

    /// Check if an image exists locally.
    async fn image_exists(&self, reference: &ImageRef) -> Result<bool, ImageError> {
        Ok(self.inspect_image(reference).await?.is_some())
    }

    /// Remove an image.
    async fn remove_image(&self, reference: &ImageRef, force: bool) -> Result<(), ImageError>;

    /// Summaries of every local image.
    async fn list_images(&self) -> Result<Vec<Value>, ImageError>;
}

/// Errors from image operations.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("authentication failed for registry: {0}")]
    AuthenticationFailed(String),

    #[error("pull failed: {0}")]
    PullFailed(String),

    #[error("push failed: {0}")]
    PushFailed(String),

    #[error("build failed: {0}")]
    BuildFailed(String),

    #[error("image in use, cannot remove: {0}")]
    InUse(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
