// ABOUTME: ApiDocker, the entry point: engine metadata, container and image access.
// ABOUTME: Hands out Container and Image handles sharing one runtime connection.

use crate::config::Settings;
use crate::container::{Container, split_command};
use crate::docker_cli::{DockerCli, ProcessOutput};
use crate::error::Result;
use crate::image::{BuildOutcome, Image};
use crate::records::{ContainerRecord, ImageRecord, group_by, index_by};
use crate::runtime::{
    self, ContainerConfig, ContainerFilters, ContainerOps, ImageOps, RegistryAuth,
    RuntimeInfoTrait, RuntimeType, RuntimeVersion, SharedRuntime,
};
use crate::types::{ContainerId, ImageRef};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

/// Result of running a container to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutput {
    pub container_id: String,
    pub exit_code: i64,
    /// Everything the container logged, trimmed.
    pub output: String,
}

/// Façade over one engine connection.
pub struct ApiDocker {
    runtime: SharedRuntime,
    runtime_type: RuntimeType,
    settings: Settings,
    cli: DockerCli,
    login: Option<RegistryAuth>,
}

impl ApiDocker {
    /// Detect the local engine (honouring `settings.runtime`) and connect.
    pub fn connect(settings: Settings) -> Result<Self> {
        let runtime = runtime::connect(settings.runtime_override())?;
        let runtime_type = runtime.runtime_type();
        Ok(Self::new(Arc::new(runtime), runtime_type, settings))
    }

    pub fn new(runtime: SharedRuntime, runtime_type: RuntimeType, settings: Settings) -> Self {
        let cli = DockerCli::from_settings(&settings.cli, runtime_type);
        Self {
            runtime,
            runtime_type,
            settings,
            cli,
            login: None,
        }
    }

    pub fn runtime(&self) -> &SharedRuntime {
        &self.runtime
    }

    pub fn runtime_type(&self) -> RuntimeType {
        self.runtime_type
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The configured CLI runner.
    pub fn docker_cli(&self) -> &DockerCli {
        &self.cli
    }

    // -------------------------------------------------------------------------
    // Engine
    // -------------------------------------------------------------------------

    /// API version the engine speaks, e.g. `1.47`.
    pub async fn client_api_version(&self) -> Result<String> {
        Ok(self.runtime.version().await?.api_version)
    }

    pub async fn client_version(&self) -> Result<RuntimeVersion> {
        Ok(self.runtime.version().await?)
    }

    /// The engine's system information document.
    pub async fn server_info(&self) -> Result<Value> {
        Ok(self.runtime.info().await?)
    }

    // -------------------------------------------------------------------------
    // Containers
    // -------------------------------------------------------------------------

    /// Handle to the container with this ID (or name). Does not check that
    /// it exists.
    pub fn container(&self, id: &str) -> Container {
        self.handle(ContainerId::new(id))
    }

    fn handle(&self, id: ContainerId) -> Container {
        Container::new(id, self.runtime.clone())
            .with_policy(self.settings.wait, self.settings.stop_timeout)
    }

    /// Create (but do not start) a container from `image:tag`.
    ///
    /// `volumes` are bind specs such as `/host/dir:/data:ro`.
    pub async fn container_create(
        &self,
        image: &str,
        tag: &str,
        command: Option<&str>,
        volumes: &[String],
        tty: bool,
    ) -> Result<Container> {
        let mut config = self.container_config(image, tag, command)?;
        config.binds = volumes.to_vec();
        config.tty = tty;

        let id = self.runtime.create_container(&config).await?;
        tracing::debug!("created {} from {}", id.short(), config.image);
        Ok(self.handle(id))
    }

    /// Run `image:tag` to completion and collect what it printed.
    ///
    /// The image is pulled first when missing. With `auto_remove` the
    /// container is removed once its output has been read, or once any step
    /// after creation has failed.
    pub async fn container_run(
        &self,
        image: &str,
        tag: &str,
        command: Option<&str>,
        auto_remove: bool,
    ) -> Result<RunOutput> {
        let config = self.container_config(image, tag, command)?;
        self.ensure_image(&config.image).await?;

        let id = self.runtime.create_container(&config).await?;
        let container = self.handle(id.clone());
        let outcome = self.run_to_exit(&container).await;

        if auto_remove {
            match self.runtime.remove_container(&id, true).await {
                Err(e) if outcome.is_ok() => return Err(e.into()),
                Err(e) => {
                    tracing::warn!("failed to remove container {}: {}", id.short(), e);
                }
                Ok(()) => {}
            }
        }

        let (exit_code, output) = outcome?;
        Ok(RunOutput {
            container_id: id.into_inner(),
            exit_code,
            output,
        })
    }

    async fn run_to_exit(&self, container: &Container) -> Result<(i64, String)> {
        container.start(false).await?;
        let exit_code = self.runtime.wait_container(container.id()).await?;
        let output = container.logs().await?.trim().to_string();
        Ok((exit_code, output))
    }

    /// Start `image:tag` in the background, pulling it first when missing.
    pub async fn container_run_detached(
        &self,
        image: &str,
        tag: &str,
        command: Option<&str>,
    ) -> Result<Container> {
        let config = self.container_config(image, tag, command)?;
        self.ensure_image(&config.image).await?;

        let id = self.runtime.create_container(&config).await?;
        let container = self.handle(id);
        container.start(false).await?;
        Ok(container)
    }

    /// Create and start a container from `config`, hand it to `f`, then stop
    /// and remove it whether or not `f` succeeded.
    ///
    /// `f` is not called when the container never reaches `running`.
    pub async fn with_temp_container<T, F, Fut>(&self, config: ContainerConfig, f: F) -> Result<T>
    where
        F: FnOnce(Container) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let id = self.runtime.create_container(&config).await?;
        let container = self.handle(id.clone());

        let result = match container.start(true).await {
            Ok(true) => f(container.clone()).await,
            Ok(false) => Err(runtime::ContainerError::NotRunning(format!(
                "{} did not reach running",
                id.short()
            ))
            .into()),
            Err(e) => Err(e),
        };

        if let Err(e) = container.stop(true).await {
            tracing::warn!("failed to stop temporary container {}: {}", id.short(), e);
        }
        if let Err(e) = self.runtime.remove_container(&id, true).await {
            tracing::warn!("failed to remove temporary container {}: {}", id.short(), e);
        }

        result
    }

    /// Records for the containers matching `filters`.
    pub async fn containers(&self, filters: &ContainerFilters) -> Result<Vec<ContainerRecord>> {
        Ok(self
            .containers_raw(filters)
            .await?
            .iter()
            .filter_map(ContainerRecord::from_raw)
            .collect())
    }

    /// Every container, running or not.
    pub async fn containers_all(&self) -> Result<Vec<ContainerRecord>> {
        self.containers(&ContainerFilters::all()).await
    }

    /// Every container, keyed by short ID.
    pub async fn containers_all_by_id(&self) -> Result<BTreeMap<String, ContainerRecord>> {
        Ok(index_by(self.containers_all().await?, |c| c.id_short.clone()))
    }

    /// Every container created from exactly `image:tag`.
    pub async fn containers_all_with_image(
        &self,
        image: &str,
        tag: &str,
    ) -> Result<Vec<ContainerRecord>> {
        let reference = ImageRef::with_tag(image, tag)?.to_string();
        let mut by_image = group_by(self.containers_all().await?, |c| c.image.clone());
        Ok(by_image.remove(&reference).unwrap_or_default())
    }

    /// Inspect documents for the containers matching `filters`. Containers
    /// removed between listing and inspecting are skipped.
    pub async fn containers_raw(&self, filters: &ContainerFilters) -> Result<Vec<Value>> {
        let summaries = self.runtime.list_containers(filters).await?;

        let mut documents = Vec::with_capacity(summaries.len());
        for summary in summaries {
            if let Some(doc) = self.runtime.inspect_container(&summary.id).await? {
                documents.push(doc);
            }
        }
        Ok(documents)
    }

    /// Handles for the containers matching `filters`.
    pub async fn container_handles(&self, filters: &ContainerFilters) -> Result<Vec<Container>> {
        Ok(self
            .runtime
            .list_containers(filters)
            .await?
            .into_iter()
            .map(|summary| self.handle(summary.id))
            .collect())
    }

    fn container_config(
        &self,
        image: &str,
        tag: &str,
        command: Option<&str>,
    ) -> Result<ContainerConfig> {
        let mut config = ContainerConfig::new(ImageRef::with_tag(image, tag)?);
        if let Some(command) = command.filter(|c| !c.trim().is_empty()) {
            config.command = Some(split_command(command)?);
        }
        Ok(config)
    }

    async fn ensure_image(&self, reference: &ImageRef) -> Result<()> {
        if !self.runtime.image_exists(reference).await? {
            tracing::info!("pulling {}", reference);
            let auth = self.registry_auth()?;
            self.runtime.pull_image(reference, auth.as_ref()).await?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Images
    // -------------------------------------------------------------------------

    /// Handle to `name:tag`. Login credentials ride along; configured ones
    /// are resolved only when a pull or push needs them.
    pub fn image(&self, name: &str, tag: &str) -> Result<Image> {
        let reference = ImageRef::with_tag(name, tag)?;
        Ok(Image::new(reference, self.runtime.clone())
            .with_auth(self.login.clone())
            .with_registry(self.settings.registry.clone()))
    }

    pub async fn image_info(&self, name: &str, tag: &str) -> Result<Option<ImageRecord>> {
        self.image(name, tag)?.info().await
    }

    pub async fn image_exists(&self, name: &str, tag: &str) -> Result<bool> {
        self.image(name, tag)?.exists().await
    }

    pub async fn image_delete(&self, name: &str, tag: &str) -> Result<bool> {
        self.image(name, tag)?.delete().await
    }

    pub async fn image_pull(&self, name: &str, tag: &str) -> Result<bool> {
        self.image(name, tag)?.pull().await
    }

    pub async fn image_push(&self, name: &str, tag: &str) -> Result<()> {
        self.image(name, tag)?.push().await
    }

    pub async fn image_build(&self, path: &Path, name: &str, tag: &str) -> Result<BuildOutcome> {
        self.image(name, tag)?.build(path).await
    }

    /// Records for every local image.
    pub async fn images(&self) -> Result<Vec<ImageRecord>> {
        Ok(self
            .runtime
            .list_images()
            .await?
            .iter()
            .filter_map(ImageRecord::from_raw)
            .collect())
    }

    /// Every `name:tag` known locally, sorted.
    pub async fn images_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .images()
            .await?
            .into_iter()
            .flat_map(|image| image.tags)
            .collect();
        names.sort();
        Ok(names)
    }

    // -------------------------------------------------------------------------
    // Registry
    // -------------------------------------------------------------------------

    /// Log in through the CLI and use these credentials for later pushes
    /// and pulls.
    pub async fn registry_login(
        &mut self,
        registry: &str,
        username: &str,
        password: &str,
    ) -> Result<ProcessOutput> {
        let output = self.cli.login(registry, username, password).await?;
        self.login = Some(RegistryAuth {
            username: username.to_string(),
            password: password.to_string(),
            server: Some(registry.to_string()),
        });
        Ok(output)
    }

    /// Credentials from the last login, else from the settings.
    fn registry_auth(&self) -> Result<Option<RegistryAuth>> {
        if let Some(ref login) = self.login {
            return Ok(Some(login.clone()));
        }
        self.settings
            .registry
            .as_ref()
            .map(|registry| registry.auth())
            .transpose()
    }
}
