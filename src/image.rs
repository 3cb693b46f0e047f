// ABOUTME: Handle to a tagged image: inspect, pull, push, build, and delete.
// ABOUTME: Registry credentials, when configured, ride along on pull and push.

use crate::build_context::{DEFAULT_DOCKERFILE, tar_directory, validate_build_dir};
use crate::config::RegistrySettings;
use crate::error::Result;
use crate::records::ImageRecord;
use crate::runtime::{BuildLog, ImageError, ImageOps, RegistryAuth, SharedRuntime};
use crate::types::ImageRef;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// What a successful build produced.
#[derive(Debug, Clone, Serialize)]
pub struct BuildOutcome {
    pub image: ImageRecord,
    pub tags: Vec<String>,
    pub logs: Vec<BuildLog>,
}

#[derive(Clone)]
pub struct Image {
    reference: ImageRef,
    runtime: SharedRuntime,
    auth: Option<RegistryAuth>,
    registry: Option<RegistrySettings>,
}

impl Image {
    pub fn new(reference: ImageRef, runtime: SharedRuntime) -> Self {
        Self {
            reference,
            runtime,
            auth: None,
            registry: None,
        }
    }

    /// Credentials to send with pull and push.
    pub fn with_auth(mut self, auth: Option<RegistryAuth>) -> Self {
        self.auth = auth;
        self
    }

    /// Configured registry, consulted on pull and push when no explicit
    /// credentials are set.
    pub fn with_registry(mut self, registry: Option<RegistrySettings>) -> Self {
        self.registry = registry;
        self
    }

    fn credentials(&self) -> Result<Option<RegistryAuth>> {
        if let Some(ref auth) = self.auth {
            return Ok(Some(auth.clone()));
        }
        self.registry
            .as_ref()
            .map(|registry| registry.auth())
            .transpose()
    }

    pub fn reference(&self) -> &ImageRef {
        &self.reference
    }

    /// `name:tag`, as passed to the engine.
    pub fn name_with_tag(&self) -> String {
        self.reference.to_string()
    }

    pub async fn info(&self) -> Result<Option<ImageRecord>> {
        Ok(self
            .runtime
            .inspect_image(&self.reference)
            .await?
            .as_ref()
            .and_then(ImageRecord::from_raw))
    }

    pub async fn exists(&self) -> Result<bool> {
        Ok(self.runtime.image_exists(&self.reference).await?)
    }

    /// Pull from the registry. Returns whether the image is present afterwards.
    pub async fn pull(&self) -> Result<bool> {
        let auth = self.credentials()?;
        self.runtime
            .pull_image(&self.reference, auth.as_ref())
            .await?;
        self.exists().await
    }

    pub async fn push(&self) -> Result<()> {
        let auth = self.credentials()?;
        self.runtime
            .push_image(&self.reference, auth.as_ref())
            .await?;
        Ok(())
    }

    /// Build `path` (which must hold a `Dockerfile`) and tag the result
    /// with this image's name.
    pub async fn build(&self, path: &Path) -> Result<BuildOutcome> {
        validate_build_dir(path, DEFAULT_DOCKERFILE)?;
        let context = tar_directory(path)?;
        tracing::debug!(
            "building {} from {} ({} byte context)",
            self.reference,
            path.display(),
            context.len()
        );

        let logs = self
            .runtime
            .build_image(context, &self.reference, DEFAULT_DOCKERFILE)
            .await?;

        let image = self.info().await?.ok_or_else(|| {
            ImageError::BuildFailed(format!("{} missing after build", self.reference))
        })?;

        Ok(BuildOutcome {
            tags: image.tags.clone(),
            image,
            logs,
        })
    }

    /// Remove the image. Returns `false` if it was not present, otherwise
    /// whether it is gone afterwards.
    pub async fn delete(&self) -> Result<bool> {
        if !self.exists().await? {
            return Ok(false);
        }
        self.runtime.remove_image(&self.reference, false).await?;
        Ok(!self.exists().await?)
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Image: {}>", self.reference)
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("reference", &self.reference)
            .field("auth", &self.auth.as_ref().map(|a| &a.username))
            .field("registry", &self.registry.as_ref().map(|r| &r.username))
            .finish()
    }
}
