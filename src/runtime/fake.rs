// ABOUTME: In-memory runtime used by unit tests of the container and image handles.
// ABOUTME: Mimics the engine's documents and state transitions without a daemon.

use crate::runtime::traits::sealed::Sealed;
use crate::runtime::traits::{
    BuildLog, ContainerConfig, ContainerError, ContainerFilters, ContainerOps, ContainerSummary,
    ExecConfig, ExecError, ExecOps, ExecResult, ImageError, ImageOps, LogError, LogLine,
    LogLineStream, LogOps, LogOptions, LogStream, RegistryAuth, RuntimeInfo, RuntimeInfoError,
    RuntimeVersion,
};
use crate::types::{ContainerId, ExecId, ImageRef};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

pub(crate) const CREATED: &str = "2024-01-15T10:30:45.123456789Z";

#[derive(Debug, Clone)]
pub(crate) struct FakeContainer {
    pub id: String,
    pub name: String,
    pub image: String,
    pub command: Vec<String>,
    pub entrypoint: Option<Vec<String>>,
    pub env: Vec<String>,
    pub labels: HashMap<String, String>,
    pub binds: Vec<String>,
    pub working_dir: String,
    pub status: String,
    pub exit_code: i64,
    pub logs: Vec<LogLine>,
    pub auto_remove: bool,
    pub tty: bool,
    pub started: bool,
}

impl FakeContainer {
    fn document(&self) -> Value {
        let volumes: serde_json::Map<String, Value> = self
            .binds
            .iter()
            .filter_map(|b| b.split(':').nth(1))
            .map(|target| (target.to_string(), json!({})))
            .collect();

        json!({
            "Id": self.id,
            "Created": CREATED,
            "Name": format!("/{}", self.name),
            "Args": self.command.iter().skip(1).collect::<Vec<_>>(),
            "Path": self.command.first().cloned().unwrap_or_default(),
            "Config": {
                "Image": self.image,
                "Cmd": self.command,
                "Entrypoint": self.entrypoint,
                "Env": self.env,
                "Labels": self.labels,
                "Volumes": if volumes.is_empty() { Value::Null } else { Value::Object(volumes) },
                "WorkingDir": self.working_dir,
                "Tty": self.tty,
            },
            "State": {
                "Status": self.status,
                "Running": self.status == "running",
                "ExitCode": self.exit_code,
            },
            "NetworkSettings": {
                "Ports": {},
            },
        })
    }
}

#[derive(Default)]
pub(crate) struct FakeState {
    pub containers: Vec<FakeContainer>,
    pub images: HashMap<String, Value>,
    /// Images that pulling cannot find.
    pub unknown_remote: HashSet<String>,
    /// Containers whose status ignores start and stop.
    pub frozen: HashSet<String>,
    pub pulls: Vec<String>,
    pub pushes: Vec<(String, Option<String>)>,
    pub builds: Vec<(String, String, usize)>,
    pub execs: HashMap<String, (String, ExecConfig)>,
    /// Polls left before a started container reports `running`.
    pub slow_start: HashMap<String, u32>,
    /// Make `wait_container` fail as if the stream dropped.
    pub fail_wait: bool,
    /// Freeze every container created from now on.
    pub freeze_new: bool,
    next_id: u64,
}

impl FakeState {
    fn next_hex(&mut self) -> String {
        self.next_id += 1;
        format!("{:064x}", 0xabc0_0000_u64 + self.next_id)
    }

    fn find(&self, key: &str) -> Option<usize> {
        self.containers.iter().position(|c| {
            c.id == key || c.name == key || (key.len() >= 4 && c.id.starts_with(key))
        })
    }
}

#[derive(Default)]
pub(crate) struct FakeRuntime {
    pub state: Mutex<FakeState>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `reference` present locally, as if pulled earlier.
    pub fn with_image(self, reference: &str) -> Self {
        self.add_image(reference);
        self
    }

    pub fn add_image(&self, reference: &str) {
        let mut state = self.state.lock().unwrap();
        let id = format!("sha256:{}", state.next_hex());
        state
            .images
            .insert(reference.to_string(), image_document(&id, reference));
    }

    pub fn freeze(&self, id: &str) {
        self.state.lock().unwrap().frozen.insert(id.to_string());
    }

    /// Once started, `id` stays `created` for `polls` inspections.
    pub fn start_after_polls(&self, id: &str, polls: u32) {
        self.state
            .lock()
            .unwrap()
            .slow_start
            .insert(id.to_string(), polls);
    }

    pub fn freeze_new_containers(&self) {
        self.state.lock().unwrap().freeze_new = true;
    }

    pub fn fail_wait(&self) {
        self.state.lock().unwrap().fail_wait = true;
    }

    pub fn container(&self, id: &str) -> Option<FakeContainer> {
        let state = self.state.lock().unwrap();
        state.find(id).map(|i| state.containers[i].clone())
    }

    pub fn container_count(&self) -> usize {
        self.state.lock().unwrap().containers.len()
    }
}

pub(crate) fn image_document(id: &str, reference: &str) -> Value {
    json!({
        "Id": id,
        "RepoTags": [reference],
        "Created": "2024-01-10T08:00:00.000000000Z",
        "Architecture": "amd64",
        "Os": "linux",
        "Size": 13256,
        "Config": {
            "Labels": {"maintainer": "dockside"},
        },
    })
}

impl Sealed for FakeRuntime {}

#[async_trait]
impl RuntimeInfo for FakeRuntime {
    async fn version(&self) -> Result<RuntimeVersion, RuntimeInfoError> {
        Ok(RuntimeVersion {
            name: "Docker".to_string(),
            version: "27.3.1".to_string(),
            api_version: "1.47".to_string(),
            os: "linux".to_string(),
            arch: "amd64".to_string(),
            kernel_version: "6.8.0".to_string(),
        })
    }

    async fn info(&self) -> Result<Value, RuntimeInfoError> {
        let state = self.state.lock().unwrap();
        Ok(json!({
            "Name": "fake",
            "Containers": state.containers.len(),
            "Images": state.images.len(),
        }))
    }

    async fn ping(&self) -> Result<(), RuntimeInfoError> {
        Ok(())
    }
}

#[async_trait]
impl ImageOps for FakeRuntime {
    async fn pull_image(
        &self,
        reference: &ImageRef,
        _auth: Option<&RegistryAuth>,
    ) -> Result<(), ImageError> {
        let name = reference.to_string();
        {
            let mut state = self.state.lock().unwrap();
            if state.unknown_remote.contains(&name) {
                return Err(ImageError::NotFound(name));
            }
            state.pulls.push(name.clone());
        }
        self.add_image(&name);
        Ok(())
    }

    async fn push_image(
        &self,
        reference: &ImageRef,
        auth: Option<&RegistryAuth>,
    ) -> Result<(), ImageError> {
        let name = reference.to_string();
        let mut state = self.state.lock().unwrap();
        if !state.images.contains_key(&name) {
            return Err(ImageError::NotFound(name));
        }
        state.pushes.push((name, auth.map(|a| a.username.clone())));
        Ok(())
    }

    async fn build_image(
        &self,
        context: Vec<u8>,
        tag: &ImageRef,
        dockerfile: &str,
    ) -> Result<Vec<BuildLog>, ImageError> {
        let name = tag.to_string();
        self.state
            .lock()
            .unwrap()
            .builds
            .push((name.clone(), dockerfile.to_string(), context.len()));
        self.add_image(&name);

        Ok(vec![
            BuildLog {
                stream: Some("Step 1/1 : FROM scratch\n".to_string()),
                ..Default::default()
            },
            BuildLog {
                stream: Some(format!("Successfully tagged {}\n", name)),
                ..Default::default()
            },
        ])
    }

    async fn inspect_image(&self, reference: &ImageRef) -> Result<Option<Value>, ImageError> {
        let state = self.state.lock().unwrap();
        Ok(state.images.get(&reference.to_string()).cloned())
    }

    async fn remove_image(&self, reference: &ImageRef, force: bool) -> Result<(), ImageError> {
        let name = reference.to_string();
        let mut state = self.state.lock().unwrap();
        if !state.images.contains_key(&name) {
            return Err(ImageError::NotFound(name));
        }
        if !force && state.containers.iter().any(|c| c.image == name) {
            return Err(ImageError::InUse(name));
        }
        state.images.remove(&name);
        Ok(())
    }

    async fn list_images(&self) -> Result<Vec<Value>, ImageError> {
        let state = self.state.lock().unwrap();
        let mut images: Vec<Value> = state.images.values().cloned().collect();
        images.sort_by_key(|i| i["Id"].as_str().unwrap_or_default().to_string());
        Ok(images)
    }
}

#[async_trait]
impl ContainerOps for FakeRuntime {
    async fn create_container(
        &self,
        config: &ContainerConfig,
    ) -> Result<ContainerId, ContainerError> {
        let image = config.image.to_string();
        let mut state = self.state.lock().unwrap();
        if !state.images.contains_key(&image) {
            return Err(ContainerError::ImageNotFound(image));
        }

        let id = state.next_hex();
        let name = config
            .name
            .clone()
            .unwrap_or_else(|| format!("fake_{}", &id[id.len() - 6..]));
        if state.find(&name).is_some() {
            return Err(ContainerError::AlreadyExists(name));
        }

        let mut env: Vec<String> = config
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        env.sort();

        if state.freeze_new {
            state.frozen.insert(id.clone());
        }
        state.containers.push(FakeContainer {
            id: id.clone(),
            name,
            image,
            command: config.command.clone().unwrap_or_default(),
            entrypoint: config.entrypoint.clone(),
            env,
            labels: config.labels.clone(),
            binds: config.binds.clone(),
            working_dir: config.working_dir.clone().unwrap_or_default(),
            status: "created".to_string(),
            exit_code: 0,
            logs: Vec::new(),
            auto_remove: config.auto_remove,
            tty: config.tty,
            started: false,
        });

        Ok(ContainerId::new(id))
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        let mut state = self.state.lock().unwrap();
        let i = state
            .find(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        if state.frozen.contains(id.as_str()) {
            return Ok(());
        }

        let slow = state.slow_start.contains_key(id.as_str());
        let container = &mut state.containers[i];
        if container.status == "running" {
            return Err(ContainerError::AlreadyRunning(id.to_string()));
        }
        container.started = true;
        if !slow {
            container.status = "running".to_string();
        }
        // The fake's "process" echoes its command.
        if !container.command.is_empty() {
            container.logs.push(LogLine {
                content: format!("{}\n", container.command.join(" ")),
                stream: LogStream::Stdout,
            });
        }
        Ok(())
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        _timeout: Duration,
    ) -> Result<(), ContainerError> {
        let mut state = self.state.lock().unwrap();
        let i = state
            .find(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        if state.frozen.contains(id.as_str()) {
            return Ok(());
        }

        if state.containers[i].status != "running" {
            return Err(ContainerError::NotRunning(id.to_string()));
        }
        if state.containers[i].auto_remove {
            state.containers.remove(i);
        } else {
            state.containers[i].status = "exited".to_string();
            state.containers[i].exit_code = 137;
        }
        Ok(())
    }

    async fn remove_container(&self, id: &ContainerId, force: bool) -> Result<(), ContainerError> {
        let mut state = self.state.lock().unwrap();
        let i = state
            .find(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        if state.containers[i].status == "running" && !force {
            return Err(ContainerError::Conflict(format!(
                "cannot remove running container {}",
                id
            )));
        }
        state.containers.remove(i);
        Ok(())
    }

    async fn inspect_container(&self, id: &ContainerId) -> Result<Option<Value>, ContainerError> {
        let mut state = self.state.lock().unwrap();
        let Some(i) = state.find(id.as_str()) else {
            return Ok(None);
        };

        let key = state.containers[i].id.clone();
        let started = state.containers[i].started;
        let ready = match state.slow_start.get_mut(&key) {
            Some(polls) if started => {
                if *polls == 0 {
                    true
                } else {
                    *polls -= 1;
                    false
                }
            }
            _ => false,
        };
        if ready {
            state.slow_start.remove(&key);
            state.containers[i].status = "running".to_string();
        }
        Ok(Some(state.containers[i].document()))
    }

    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let state = self.state.lock().unwrap();
        let mut found: Vec<ContainerSummary> = state
            .containers
            .iter()
            .filter(|c| filters.all || c.status == "running")
            .filter(|c| filters.ancestor.as_ref().is_none_or(|a| &c.image == a))
            .filter(|c| filters.name.as_ref().is_none_or(|n| c.name.contains(n.as_str())))
            .filter(|c| {
                filters
                    .labels
                    .iter()
                    .all(|(k, v)| c.labels.get(k) == Some(v))
            })
            .map(|c| ContainerSummary {
                id: ContainerId::new(c.id.clone()),
                name: c.name.clone(),
                image: c.image.clone(),
                state: c.status.clone(),
                status: c.status.clone(),
                labels: c.labels.clone(),
            })
            .collect();

        if let Some(limit) = filters.limit {
            found.truncate(limit.max(0) as usize);
        }
        Ok(found)
    }

    async fn wait_container(&self, id: &ContainerId) -> Result<i64, ContainerError> {
        let mut state = self.state.lock().unwrap();
        let i = state
            .find(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        if state.fail_wait {
            return Err(ContainerError::Runtime("wait stream dropped".to_string()));
        }
        let container = &mut state.containers[i];
        if container.status == "running" {
            container.status = "exited".to_string();
        }
        Ok(container.exit_code)
    }
}

#[async_trait]
impl ExecOps for FakeRuntime {
    async fn exec_create(
        &self,
        container: &ContainerId,
        config: &ExecConfig,
    ) -> Result<ExecId, ExecError> {
        let mut state = self.state.lock().unwrap();
        let i = state
            .find(container.as_str())
            .ok_or_else(|| ExecError::ContainerNotFound(container.to_string()))?;
        if state.containers[i].status != "running" {
            return Err(ExecError::ContainerNotRunning(container.to_string()));
        }

        let exec_id = state.next_hex();
        let container_id = state.containers[i].id.clone();
        state
            .execs
            .insert(exec_id.clone(), (container_id, config.clone()));
        Ok(ExecId::new(exec_id))
    }

    async fn exec_start(&self, exec_id: &ExecId) -> Result<ExecResult, ExecError> {
        let state = self.state.lock().unwrap();
        let (_, config) = state
            .execs
            .get(exec_id.as_str())
            .ok_or_else(|| ExecError::ExecNotFound(exec_id.to_string()))?;

        // `false` fails like the coreutils binary, everything else echoes.
        if config.cmd.first().map(String::as_str) == Some("false") {
            let stderr = b"command failed\n".to_vec();
            return Ok(ExecResult {
                exit_code: 1,
                stdout: Vec::new(),
                output: stderr.clone(),
                stderr,
            });
        }

        let mut line = String::new();
        if let Some(ref dir) = config.working_dir {
            line.push_str(&format!("{}$ ", dir));
        }
        line.push_str(&config.cmd.join(" "));
        line.push('\n');

        Ok(ExecResult {
            exit_code: 0,
            stdout: line.clone().into_bytes(),
            stderr: Vec::new(),
            output: line.into_bytes(),
        })
    }
}

#[async_trait]
impl LogOps for FakeRuntime {
    async fn container_logs(
        &self,
        id: &ContainerId,
        opts: &LogOptions,
    ) -> Result<LogLineStream, LogError> {
        let state = self.state.lock().unwrap();
        let i = state
            .find(id.as_str())
            .ok_or_else(|| LogError::ContainerNotFound(id.to_string()))?;

        let lines: Vec<Result<LogLine, LogError>> = state.containers[i]
            .logs
            .iter()
            .filter(|l| match l.stream {
                LogStream::Stdout => opts.stdout,
                LogStream::Stderr => opts.stderr,
            })
            .cloned()
            .map(Ok)
            .collect();

        Ok(Box::pin(futures::stream::iter(lines)))
    }
}
