// ABOUTME: Bollard-based container runtime implementation.
// ABOUTME: Supports both Docker and Podman via the Docker-compatible API.

use crate::runtime::traits::sealed::Sealed;
use crate::runtime::traits::{
    BuildLog, ContainerConfig, ContainerError, ContainerFilters, ContainerOps, ContainerSummary,
    ExecConfig, ExecError, ExecInfo, ExecOps, ExecResult, ImageError, ImageOps, LogError,
    LogLine, LogLineStream, LogOps, LogOptions, LogStream, RegistryAuth, RuntimeInfo,
    RuntimeInfoError, RuntimeVersion,
};
use crate::runtime::types::RuntimeType;
use crate::types::{ContainerId, ExecId, ImageRef};
use async_trait::async_trait;
use bollard::Docker;
use bollard::auth::DockerCredentials;
use bollard::container::LogOutput;
use bollard::exec::{StartExecOptions, StartExecResults};
use bollard::models::{BuildInfo, ContainerCreateBody, HostConfig};
use bollard::query_parameters::{
    BuildImageOptions, CreateContainerOptions, CreateImageOptions, InspectContainerOptions,
    ListContainersOptions, ListImagesOptions, LogsOptions, PushImageOptions,
    RemoveContainerOptions, RemoveImageOptions, StartContainerOptions, StopContainerOptions,
    WaitContainerOptions,
};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use http_body_util::{Either, Full};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Seconds bollard waits on a single request.
const REQUEST_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn status_of(e: &bollard::errors::Error) -> Option<(u16, &str)> {
    match e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } => Some((*status_code, message.as_str())),
        _ => None,
    }
}

fn is_not_found(e: &bollard::errors::Error) -> bool {
    matches!(status_of(e), Some((404, _)))
}

fn map_image_pull_error(e: bollard::errors::Error, image_name: &str) -> ImageError {
    match status_of(&e) {
        Some((404, message)) => ImageError::NotFound(format!("{}: {}", image_name, message)),
        Some((401 | 403, message)) => {
            ImageError::AuthenticationFailed(format!("{}: {}", image_name, message))
        }
        _ => ImageError::PullFailed(format!("{}: {}", image_name, e)),
    }
}

fn map_image_push_error(e: bollard::errors::Error, image_name: &str) -> ImageError {
    match status_of(&e) {
        Some((404, message)) => ImageError::NotFound(format!("{}: {}", image_name, message)),
        Some((401 | 403, message)) => {
            ImageError::AuthenticationFailed(format!("{}: {}", image_name, message))
        }
        _ => ImageError::PushFailed(format!("{}: {}", image_name, e)),
    }
}

fn map_image_remove_error(e: bollard::errors::Error, image_name: &str) -> ImageError {
    match status_of(&e) {
        Some((404, _)) => ImageError::NotFound(image_name.to_string()),
        Some((409, message)) => ImageError::InUse(format!("{}: {}", image_name, message)),
        _ => ImageError::Runtime(format!("failed to remove {}: {}", image_name, e)),
    }
}

fn map_container_create_error(e: bollard::errors::Error) -> ContainerError {
    match status_of(&e) {
        Some((404, message)) => ContainerError::ImageNotFound(message.to_string()),
        Some((409, message)) => ContainerError::AlreadyExists(message.to_string()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_start_error(e: bollard::errors::Error) -> ContainerError {
    match status_of(&e) {
        Some((404, message)) => ContainerError::NotFound(message.to_string()),
        Some((304, message)) => ContainerError::AlreadyRunning(message.to_string()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_stop_error(e: bollard::errors::Error) -> ContainerError {
    match status_of(&e) {
        Some((404, message)) => ContainerError::NotFound(message.to_string()),
        Some((304, message)) => ContainerError::NotRunning(message.to_string()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_remove_error(e: bollard::errors::Error) -> ContainerError {
    match status_of(&e) {
        Some((404, message)) => ContainerError::NotFound(message.to_string()),
        Some((409, message)) => ContainerError::Conflict(message.to_string()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_not_found_error(e: bollard::errors::Error) -> ContainerError {
    match status_of(&e) {
        Some((404, message)) => ContainerError::NotFound(message.to_string()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_exec_create_error(e: bollard::errors::Error) -> ExecError {
    match status_of(&e) {
        Some((404, message)) => ExecError::ContainerNotFound(message.to_string()),
        Some((409, message)) => ExecError::ContainerNotRunning(message.to_string()),
        _ => ExecError::Runtime(e.to_string()),
    }
}

fn map_exec_not_found_error(e: bollard::errors::Error) -> ExecError {
    match status_of(&e) {
        Some((404, message)) => ExecError::ExecNotFound(message.to_string()),
        _ => ExecError::Runtime(e.to_string()),
    }
}

fn map_log_error(e: bollard::errors::Error) -> LogError {
    match status_of(&e) {
        Some((404, message)) => LogError::ContainerNotFound(message.to_string()),
        _ => LogError::StreamError(e.to_string()),
    }
}

/// Progress streams report failures in-band as `errorDetail` / `error`.
fn in_band_error<T: Serialize>(item: &T) -> Option<String> {
    let value = serde_json::to_value(item).ok()?;
    value
        .get("errorDetail")
        .and_then(|d| d.get("message"))
        .or_else(|| value.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn to_raw<T: Serialize>(item: &T) -> Result<Value, String> {
    serde_json::to_value(item).map_err(|e| format!("failed to encode engine response: {}", e))
}

fn credentials(auth: Option<&RegistryAuth>) -> Option<DockerCredentials> {
    auth.map(|a| DockerCredentials {
        username: Some(a.username.clone()),
        password: Some(a.password.clone()),
        serveraddress: a.server.clone(),
        ..Default::default()
    })
}

impl BuildLog {
    fn from_build_info(info: BuildInfo) -> Self {
        BuildLog {
            stream: info.stream,
            status: info.status,
            error: info.error_detail.and_then(|detail| detail.message),
        }
    }
}

type ExecOutput = Pin<Box<dyn Stream<Item = Result<LogOutput, bollard::errors::Error>> + Send>>;

const EXEC_POLL_INTERVAL: Duration = Duration::from_millis(100);
const EXEC_MAX_WAIT: Duration = Duration::from_secs(300);

fn push_exec_output(
    result: &mut ExecResult,
    item: Result<LogOutput, bollard::errors::Error>,
) -> Result<(), ExecError> {
    match item.map_err(|e| ExecError::Failed(e.to_string()))? {
        LogOutput::StdOut { message } | LogOutput::Console { message } => {
            result.output.extend_from_slice(&message);
            result.stdout.extend_from_slice(&message);
        }
        LogOutput::StdErr { message } => {
            result.output.extend_from_slice(&message);
            result.stderr.extend_from_slice(&message);
        }
        LogOutput::StdIn { .. } => {}
    }
    Ok(())
}

/// Read an attached exec stream until `finished` yields the exit code.
///
/// Podman may keep the stream open after the process exits, so completion
/// is decided by polling rather than by the end of the stream. Output that
/// is already buffered when the process finishes is still collected.
async fn collect_exec_output<F, Fut>(
    mut output: ExecOutput,
    poll_interval: Duration,
    max_wait: Duration,
    mut finished: F,
) -> Result<ExecResult, ExecError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<i64>, ExecError>>,
{
    let deadline = tokio::time::Instant::now() + max_wait;
    let mut ticker = tokio::time::interval(poll_interval);
    let mut result = ExecResult::default();
    let mut open = true;

    loop {
        tokio::select! {
            biased;
            item = output.next(), if open => match item {
                Some(item) => push_exec_output(&mut result, item)?,
                None => open = false,
            },
            _ = ticker.tick() => {
                if let Some(exit_code) = finished().await? {
                    while open {
                        match tokio::time::timeout(poll_interval, output.next()).await {
                            Ok(Some(item)) => push_exec_output(&mut result, item)?,
                            _ => open = false,
                        }
                    }
                    result.exit_code = exit_code;
                    return Ok(result);
                }
                if tokio::time::Instant::now() >= deadline {
                    return Err(ExecError::Failed("exec timed out".to_string()));
                }
            }
        }
    }
}

// =============================================================================
// BollardRuntime
// =============================================================================

/// Container runtime implementation using bollard.
///
/// Supports both Docker and Podman via the Docker-compatible API.
pub struct BollardRuntime {
    client: Docker,
    runtime_type: RuntimeType,
}

impl BollardRuntime {
    /// Create a new BollardRuntime from a Docker client.
    pub fn new(client: Docker, runtime_type: RuntimeType) -> Self {
        Self {
            client,
            runtime_type,
        }
    }

    /// Connect to a container runtime using detected runtime info.
    ///
    /// Use with `detect_local()` or `detect()` to find the endpoint.
    pub fn connect(info: &super::types::RuntimeInfo) -> Result<Self, RuntimeInfoError> {
        let endpoint = info.socket_path.as_str();
        let client = if endpoint.starts_with("tcp://") || endpoint.starts_with("http://") {
            Docker::connect_with_http(endpoint, REQUEST_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
        } else {
            let socket = endpoint.strip_prefix("unix://").unwrap_or(endpoint);
            Docker::connect_with_unix(socket, REQUEST_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
        }
        .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;

        Ok(Self::new(client, info.runtime_type))
    }

    /// Get the runtime type (Docker or Podman).
    pub fn runtime_type(&self) -> RuntimeType {
        self.runtime_type
    }

    async fn exec_inspect_internal(&self, exec_id: &ExecId) -> Result<ExecInfo, ExecError> {
        let details = self
            .client
            .inspect_exec(exec_id.as_str())
            .await
            .map_err(map_exec_not_found_error)?;

        Ok(ExecInfo {
            running: details.running.unwrap_or(false),
            exit_code: details.exit_code,
            container_id: ContainerId::new(details.container_id.unwrap_or_default()),
        })
    }
}

impl Sealed for BollardRuntime {}

#[async_trait]
impl RuntimeInfo for BollardRuntime {
    async fn version(&self) -> Result<RuntimeVersion, RuntimeInfoError> {
        let version = self
            .client
            .version()
            .await
            .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;

        let name = match self.runtime_type {
            RuntimeType::Docker => "Docker".to_string(),
            RuntimeType::Podman => "Podman".to_string(),
        };

        Ok(RuntimeVersion {
            name,
            version: version.version.unwrap_or_default(),
            api_version: version.api_version.unwrap_or_default(),
            os: version.os.unwrap_or_default(),
            arch: version.arch.unwrap_or_default(),
            kernel_version: version.kernel_version.unwrap_or_default(),
        })
    }

    async fn info(&self) -> Result<Value, RuntimeInfoError> {
        let info = self
            .client
            .info()
            .await
            .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;

        to_raw(&info).map_err(RuntimeInfoError::Runtime)
    }

    async fn ping(&self) -> Result<(), RuntimeInfoError> {
        self.client
            .ping()
            .await
            .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ImageOps for BollardRuntime {
    async fn pull_image(
        &self,
        reference: &ImageRef,
        auth: Option<&RegistryAuth>,
    ) -> Result<(), ImageError> {
        let image_name = reference.to_string();

        // A digest pins the image, so the whole reference goes in fromImage.
        let opts = if reference.digest().is_some() {
            CreateImageOptions {
                from_image: Some(image_name.clone()),
                ..Default::default()
            }
        } else {
            CreateImageOptions {
                from_image: Some(reference.repository()),
                tag: reference.tag().map(str::to_string),
                ..Default::default()
            }
        };

        let mut stream = self.client.create_image(Some(opts), None, credentials(auth));
        while let Some(result) = stream.next().await {
            let info = result.map_err(|e| map_image_pull_error(e, &image_name))?;
            if let Some(message) = in_band_error(&info) {
                return Err(ImageError::PullFailed(format!("{}: {}", image_name, message)));
            }
        }

        tracing::debug!("pulled {}", image_name);
        Ok(())
    }

    async fn push_image(
        &self,
        reference: &ImageRef,
        auth: Option<&RegistryAuth>,
    ) -> Result<(), ImageError> {
        let image_name = reference.to_string();

        let opts = PushImageOptions {
            tag: reference.tag().map(str::to_string),
            ..Default::default()
        };

        let mut stream =
            self.client
                .push_image(&reference.repository(), Some(opts), credentials(auth));
        while let Some(result) = stream.next().await {
            let info = result.map_err(|e| map_image_push_error(e, &image_name))?;
            if let Some(message) = in_band_error(&info) {
                return Err(ImageError::PushFailed(format!("{}: {}", image_name, message)));
            }
        }

        tracing::debug!("pushed {}", image_name);
        Ok(())
    }

    async fn build_image(
        &self,
        context: Vec<u8>,
        tag: &ImageRef,
        dockerfile: &str,
    ) -> Result<Vec<BuildLog>, ImageError> {
        let options = BuildImageOptions {
            dockerfile: dockerfile.to_string(),
            t: Some(tag.to_string()),
            ..Default::default()
        };

        let body = Either::Left(Full::new(Bytes::from(context)));
        let mut build_stream = self.client.build_image(options, None, Some(body));

        let mut logs = Vec::new();
        while let Some(result) = build_stream.next().await {
            let output = result.map_err(|e| ImageError::BuildFailed(e.to_string()))?;
            let log = BuildLog::from_build_info(output);
            if let Some(ref message) = log.error {
                return Err(ImageError::BuildFailed(message.clone()));
            }
            if let Some(ref line) = log.stream {
                tracing::debug!("build {}: {}", tag, line.trim_end());
            }
            logs.push(log);
        }

        Ok(logs)
    }

    async fn inspect_image(&self, reference: &ImageRef) -> Result<Option<Value>, ImageError> {
        let image_name = reference.to_string();

        match self.client.inspect_image(&image_name).await {
            Ok(details) => to_raw(&details).map(Some).map_err(ImageError::Runtime),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(ImageError::Runtime(format!(
                "failed to inspect {}: {}",
                image_name, e
            ))),
        }
    }

    async fn remove_image(&self, reference: &ImageRef, force: bool) -> Result<(), ImageError> {
        let image_name = reference.to_string();

        let opts = RemoveImageOptions {
            force,
            ..Default::default()
        };

        self.client
            .remove_image(&image_name, Some(opts), None)
            .await
            .map_err(|e| map_image_remove_error(e, &image_name))?;

        Ok(())
    }

    async fn list_images(&self) -> Result<Vec<Value>, ImageError> {
        let opts = ListImagesOptions {
            all: false,
            ..Default::default()
        };

        let images = self
            .client
            .list_images(Some(opts))
            .await
            .map_err(|e| ImageError::Runtime(e.to_string()))?;

        images
            .iter()
            .map(|image| to_raw(image).map_err(ImageError::Runtime))
            .collect()
    }
}

#[async_trait]
impl ContainerOps for BollardRuntime {
    async fn create_container(
        &self,
        config: &ContainerConfig,
    ) -> Result<ContainerId, ContainerError> {
        let env: Vec<String> = config
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();

        let host_config = HostConfig {
            binds: if config.binds.is_empty() {
                None
            } else {
                Some(config.binds.clone())
            },
            auto_remove: Some(config.auto_remove),
            ..Default::default()
        };

        let container_config = ContainerCreateBody {
            image: Some(config.image.to_string()),
            cmd: config.command.clone(),
            entrypoint: config.entrypoint.clone(),
            env: if env.is_empty() { None } else { Some(env) },
            labels: if config.labels.is_empty() {
                None
            } else {
                Some(config.labels.clone())
            },
            working_dir: config.working_dir.clone(),
            user: config.user.clone(),
            tty: Some(config.tty),
            host_config: Some(host_config),
            ..Default::default()
        };

        let opts = config.name.as_ref().map(|name| CreateContainerOptions {
            name: Some(name.clone()),
            ..Default::default()
        });

        let response = self
            .client
            .create_container(opts, container_config)
            .await
            .map_err(map_container_create_error)?;

        for warning in &response.warnings {
            tracing::warn!("create {}: {}", config.image, warning);
        }

        Ok(ContainerId::new(response.id))
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.client
            .start_container(id.as_str(), None::<StartContainerOptions>)
            .await
            .map_err(map_container_start_error)
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        timeout: Duration,
    ) -> Result<(), ContainerError> {
        let opts = StopContainerOptions {
            t: Some(timeout.as_secs() as i32),
            signal: None,
        };

        self.client
            .stop_container(id.as_str(), Some(opts))
            .await
            .map_err(map_container_stop_error)
    }

    async fn remove_container(&self, id: &ContainerId, force: bool) -> Result<(), ContainerError> {
        let opts = RemoveContainerOptions {
            force,
            ..Default::default()
        };

        self.client
            .remove_container(id.as_str(), Some(opts))
            .await
            .map_err(map_container_remove_error)?;

        Ok(())
    }

    async fn inspect_container(&self, id: &ContainerId) -> Result<Option<Value>, ContainerError> {
        match self
            .client
            .inspect_container(id.as_str(), None::<InspectContainerOptions>)
            .await
        {
            Ok(details) => to_raw(&details).map(Some).map_err(ContainerError::Runtime),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(ContainerError::Runtime(e.to_string())),
        }
    }

    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let opts = ListContainersOptions {
            all: filters.all,
            limit: filters.limit,
            filters: Some(filters.to_filter_map()),
            ..Default::default()
        };

        // Podman reports "stopping" as a container state during shutdown, which
        // bollard fails to deserialize. It is transient, so retry briefly.
        let mut last_error = None;
        for attempt in 0..3 {
            match self.client.list_containers(Some(opts.clone())).await {
                Ok(containers) => {
                    return Ok(containers
                        .into_iter()
                        .map(|c| {
                            let names = c.names.unwrap_or_default();
                            let name = names
                                .first()
                                .map(|n| n.trim_start_matches('/').to_string())
                                .unwrap_or_default();

                            let state = c
                                .state
                                .map(|s| format!("{:?}", s).to_lowercase())
                                .unwrap_or_default();

                            ContainerSummary {
                                id: ContainerId::new(c.id.unwrap_or_default()),
                                name,
                                image: c.image.unwrap_or_default(),
                                state,
                                status: c.status.unwrap_or_default(),
                                labels: c.labels.unwrap_or_default(),
                            }
                        })
                        .collect());
                }
                Err(e) => {
                    let err_str = e.to_string();
                    if (err_str.contains("unknown variant `stopping`")
                        || err_str.contains("unknown variant `stopped`"))
                        && attempt < 2
                    {
                        tokio::time::sleep(Duration::from_millis(500)).await;
                        last_error = Some(err_str);
                        continue;
                    }
                    return Err(ContainerError::Runtime(err_str));
                }
            }
        }

        Err(ContainerError::Runtime(
            last_error.unwrap_or_else(|| "list_containers failed".to_string()),
        ))
    }

    async fn wait_container(&self, id: &ContainerId) -> Result<i64, ContainerError> {
        let mut stream = self
            .client
            .wait_container(id.as_str(), None::<WaitContainerOptions>);

        let mut exit_code = 0;
        while let Some(item) = stream.next().await {
            match item {
                Ok(response) => exit_code = response.status_code,
                // bollard reports non-zero exits as an error carrying the code.
                Err(bollard::errors::Error::DockerContainerWaitError { code, .. }) => {
                    return Ok(code);
                }
                Err(e) => return Err(map_container_not_found_error(e)),
            }
        }

        Ok(exit_code)
    }
}

#[async_trait]
impl ExecOps for BollardRuntime {
    async fn exec_create(
        &self,
        container: &ContainerId,
        config: &ExecConfig,
    ) -> Result<ExecId, ExecError> {
        let opts = bollard::models::ExecConfig {
            cmd: Some(config.cmd.clone()),
            env: if config.env.is_empty() {
                None
            } else {
                Some(config.env.clone())
            },
            working_dir: config.working_dir.clone(),
            user: config.user.clone(),
            attach_stdin: Some(config.attach_stdin),
            attach_stdout: Some(config.attach_stdout),
            attach_stderr: Some(config.attach_stderr),
            tty: Some(config.tty),
            privileged: Some(config.privileged),
            ..Default::default()
        };

        let response = self
            .client
            .create_exec(container.as_str(), opts)
            .await
            .map_err(map_exec_create_error)?;

        Ok(ExecId::new(response.id))
    }

    async fn exec_start(&self, exec_id: &ExecId) -> Result<ExecResult, ExecError> {
        let opts = StartExecOptions {
            detach: false,
            ..Default::default()
        };

        let result = self
            .client
            .start_exec(exec_id.as_str(), Some(opts))
            .await
            .map_err(map_exec_not_found_error)?;

        let StartExecResults::Attached { output, .. } = result else {
            return Err(ExecError::Failed(format!(
                "exec {} started detached",
                exec_id
            )));
        };

        let finished = move || async move {
            let info = self.exec_inspect_internal(exec_id).await?;
            Ok::<_, ExecError>((!info.running).then(|| info.exit_code.unwrap_or(0)))
        };
        collect_exec_output(output, EXEC_POLL_INTERVAL, EXEC_MAX_WAIT, finished).await
    }
}

#[async_trait]
impl LogOps for BollardRuntime {
    async fn container_logs(
        &self,
        id: &ContainerId,
        opts: &LogOptions,
    ) -> Result<LogLineStream, LogError> {
        let log_opts = LogsOptions {
            stdout: opts.stdout,
            stderr: opts.stderr,
            tail: "all".to_string(),
            ..Default::default()
        };

        let stream = self.client.logs(id.as_str(), Some(log_opts));

        let mapped_stream = stream.map(|result| {
            result
                .map(|output| {
                    let (stream_type, data) = match output {
                        LogOutput::StdErr { message } => (LogStream::Stderr, message),
                        LogOutput::StdOut { message }
                        | LogOutput::StdIn { message }
                        | LogOutput::Console { message } => (LogStream::Stdout, message),
                    };

                    LogLine {
                        content: String::from_utf8_lossy(&data).to_string(),
                        stream: stream_type,
                    }
                })
                .map_err(map_log_error)
        });

        Ok(Box::pin(mapped_stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bollard::models::ErrorDetail;
    use serde_json::json;

    #[test]
    fn in_band_error_prefers_error_detail() {
        let item = json!({"errorDetail": {"message": "manifest unknown"}, "error": "legacy"});
        assert_eq!(in_band_error(&item).as_deref(), Some("manifest unknown"));
    }

    #[test]
    fn in_band_error_falls_back_to_error() {
        let item = json!({"error": "denied"});
        assert_eq!(in_band_error(&item).as_deref(), Some("denied"));
        assert_eq!(in_band_error(&json!({"status": "Pulling"})), None);
    }

    #[test]
    fn build_log_from_stream_line() {
        let log = BuildLog::from_build_info(BuildInfo {
            stream: Some("Step 1/3 : FROM centos:8\n".to_string()),
            ..Default::default()
        });
        assert_eq!(log.stream.as_deref(), Some("Step 1/3 : FROM centos:8\n"));
        assert!(log.error.is_none());
    }

    #[test]
    fn build_log_carries_error_detail() {
        let log = BuildLog::from_build_info(BuildInfo {
            error_detail: Some(ErrorDetail {
                code: Some(1),
                message: Some("COPY failed: no such file".to_string()),
            }),
            ..Default::default()
        });
        assert_eq!(log.error.as_deref(), Some("COPY failed: no such file"));
        assert!(log.stream.is_none());
    }

    fn exec_stream(items: Vec<LogOutput>, close: bool) -> ExecOutput {
        let items = futures::stream::iter(items.into_iter().map(Ok));
        if close {
            Box::pin(items)
        } else {
            Box::pin(items.chain(futures::stream::pending()))
        }
    }

    fn stdout(text: &str) -> LogOutput {
        LogOutput::StdOut {
            message: Bytes::from(text.to_string()),
        }
    }

    fn stderr(text: &str) -> LogOutput {
        LogOutput::StdErr {
            message: Bytes::from(text.to_string()),
        }
    }

    #[tokio::test]
    async fn exec_output_collected_when_stream_never_closes() {
        let output = exec_stream(vec![stdout("hello\n"), stderr("oops\n")], false);
        let mut polls = 0;
        let finished = move || {
            polls += 1;
            let done = polls >= 3;
            async move { Ok(done.then_some(7)) }
        };

        let result = collect_exec_output(
            output,
            Duration::from_millis(1),
            Duration::from_secs(5),
            finished,
        )
        .await
        .unwrap();

        assert_eq!(result.exit_code, 7);
        assert_eq!(result.stdout, b"hello\n");
        assert_eq!(result.stderr, b"oops\n");
        assert_eq!(result.output, b"hello\noops\n");
    }

    #[tokio::test]
    async fn exec_output_collected_when_stream_closes_first() {
        let output = exec_stream(vec![stdout("done\n")], true);
        let result = collect_exec_output(
            output,
            Duration::from_millis(1),
            Duration::from_secs(5),
            || async { Ok(Some(0)) },
        )
        .await
        .unwrap();

        assert_eq!(result.exit_code, 0);
        assert_eq!(result.output, b"done\n");
    }

    #[tokio::test]
    async fn exec_times_out_when_never_finished() {
        let output = exec_stream(Vec::new(), false);
        let err = collect_exec_output(
            output,
            Duration::from_millis(1),
            Duration::from_millis(10),
            || async { Ok(None) },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ExecError::Failed(ref m) if m.contains("timed out")));
    }

    #[test]
    fn not_found_detection() {
        let err = bollard::errors::Error::DockerResponseServerError {
            status_code: 404,
            message: "No such container".to_string(),
        };
        assert!(is_not_found(&err));
        assert!(matches!(
            map_container_start_error(err),
            ContainerError::NotFound(_)
        ));
    }

    #[test]
    fn image_in_use_maps_from_conflict() {
        let err = bollard::errors::Error::DockerResponseServerError {
            status_code: 409,
            message: "image is being used by stopped container".to_string(),
        };
        assert!(matches!(
            map_image_remove_error(err, "hello-world:latest"),
            ImageError::InUse(_)
        ));
    }
}
