// ABOUTME: Handle to a single container: inspect, lifecycle, exec, and logs.
// ABOUTME: Status changes are awaited with a bounded fixed-interval poll.

use crate::config::WaitPolicy;
use crate::error::{Error, Result};
use crate::records::ContainerRecord;
use crate::runtime::{
    ContainerError, ContainerOps, ExecConfig, ExecOps, ExecResult, LogError, LogOps, LogOptions,
    SharedRuntime,
};
use crate::types::{ContainerId, ContainerStatus};
use futures::StreamExt;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Default grace period before a stopped container is killed.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Split a command line the way a POSIX shell would.
pub(crate) fn split_command(command: &str) -> Result<Vec<String>> {
    shell_words::split(command)
        .map_err(|e| Error::InvalidCommand(command.to_string(), e.to_string()))
}

/// A container known by ID. Holding one does not mean the container exists;
/// every query goes to the engine.
#[derive(Clone)]
pub struct Container {
    id: ContainerId,
    runtime: SharedRuntime,
    wait: WaitPolicy,
    stop_timeout: Duration,
}

impl Container {
    pub fn new(id: ContainerId, runtime: SharedRuntime) -> Self {
        Self {
            id,
            runtime,
            wait: WaitPolicy::default(),
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }

    /// Use `wait` for status polling and `stop_timeout` when stopping.
    pub fn with_policy(mut self, wait: WaitPolicy, stop_timeout: Duration) -> Self {
        self.wait = wait;
        self.stop_timeout = stop_timeout;
        self
    }

    pub fn id(&self) -> &ContainerId {
        &self.id
    }

    pub fn short_id(&self) -> &str {
        self.id.short()
    }

    /// The engine's inspect document, or `None` if the container is gone.
    pub async fn info_raw(&self) -> Result<Option<Value>> {
        Ok(self.runtime.inspect_container(&self.id).await?)
    }

    pub async fn info(&self) -> Result<Option<ContainerRecord>> {
        Ok(self
            .info_raw()
            .await?
            .as_ref()
            .and_then(ContainerRecord::from_raw))
    }

    pub async fn exists(&self) -> Result<bool> {
        Ok(self.info_raw().await?.is_some())
    }

    /// Current status; `NotFound` when the engine has no such container.
    pub async fn status(&self) -> Result<ContainerStatus> {
        Ok(self
            .info()
            .await?
            .map(|record| record.status)
            .unwrap_or(ContainerStatus::NotFound))
    }

    /// The image the container was created from.
    pub async fn image(&self) -> Result<Option<String>> {
        Ok(self.info().await?.map(|record| record.image))
    }

    /// Container labels; empty when the container does not exist.
    pub async fn labels(&self) -> Result<BTreeMap<String, String>> {
        Ok(self
            .info()
            .await?
            .map(|record| record.labels)
            .unwrap_or_default())
    }

    /// Everything the container has written to stdout and stderr so far.
    /// Empty when the container does not exist.
    pub async fn logs(&self) -> Result<String> {
        let mut stream = match self
            .runtime
            .container_logs(&self.id, &LogOptions::all())
            .await
        {
            Ok(stream) => stream,
            Err(LogError::ContainerNotFound(_)) => return Ok(String::new()),
            Err(e) => return Err(e.into()),
        };

        let mut logs = String::new();
        while let Some(line) = stream.next().await {
            match line {
                Ok(line) => logs.push_str(&line.content),
                Err(LogError::ContainerNotFound(_)) => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(logs)
    }

    /// Run `command` (split shell-style) inside the running container and
    /// return its combined output.
    pub async fn exec(&self, command: &str, workdir: Option<&str>) -> Result<String> {
        let config = ExecConfig::command(split_command(command)?, workdir.map(str::to_string));
        let result = self.exec_with(&config).await?;
        if result.exit_code != 0 {
            tracing::debug!(
                "exec in {} exited with {}: {}",
                self.short_id(),
                result.exit_code,
                command
            );
        }
        Ok(result.output_text())
    }

    pub async fn exec_with(&self, config: &ExecConfig) -> Result<ExecResult> {
        Ok(self.runtime.exec(&self.id, config).await?)
    }

    /// Start the container. When `wait_for_running`, returns whether it
    /// reached `running` within the wait policy.
    pub async fn start(&self, wait_for_running: bool) -> Result<bool> {
        match self.runtime.start_container(&self.id).await {
            Ok(()) | Err(ContainerError::AlreadyRunning(_)) => {}
            Err(e) => return Err(e.into()),
        }

        if wait_for_running {
            return self.wait_for_status(ContainerStatus::Running).await;
        }
        Ok(true)
    }

    /// Stop the container. Returns `false` without doing anything when it
    /// is not running.
    pub async fn stop(&self, wait_for_exit: bool) -> Result<bool> {
        if self.status().await? != ContainerStatus::Running {
            return Ok(false);
        }

        match self
            .runtime
            .stop_container(&self.id, self.stop_timeout)
            .await
        {
            Ok(()) => {}
            Err(ContainerError::NotRunning(_) | ContainerError::NotFound(_)) => return Ok(false),
            Err(e) => return Err(e.into()),
        }

        if wait_for_exit {
            self.wait_for_status(ContainerStatus::Exited).await?;
        }
        Ok(true)
    }

    /// Remove the container. Running containers are left alone; returns
    /// `true` only when something was removed.
    pub async fn delete(&self) -> Result<bool> {
        match self.status().await? {
            ContainerStatus::NotFound | ContainerStatus::Running => return Ok(false),
            _ => {}
        }

        match self.runtime.remove_container(&self.id, false).await {
            Ok(()) => Ok(true),
            Err(ContainerError::NotFound(_) | ContainerError::Conflict(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Poll until the container reports `desired`.
    ///
    /// Gives up after the policy's attempt count, or at once if the
    /// container disappears while waiting for anything but `NotFound`.
    pub async fn wait_for_status(&self, desired: ContainerStatus) -> Result<bool> {
        let mut remaining = self.wait.attempts;
        while remaining > 0 {
            let status = self.status().await?;
            tracing::debug!("{}: {} : {} (want {})", remaining, self.id, status, desired);

            if status == desired {
                return Ok(true);
            }
            if status == ContainerStatus::NotFound {
                return Ok(false);
            }

            tokio::time::sleep(self.wait.interval).await;
            remaining -= 1;
        }
        Ok(false)
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Container: {}>", self.short_id())
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.id)
            .field("wait", &self.wait)
            .finish()
    }
}
