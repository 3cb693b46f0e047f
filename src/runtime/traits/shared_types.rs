// ABOUTME: Shared types used across runtime trait definitions.
// ABOUTME: ContainerConfig, ExecConfig, ExecResult, RegistryAuth, BuildLog, RuntimeVersion.

use crate::types::{ContainerId, ImageRef};
use serde::Serialize;
use std::collections::HashMap;

/// Configuration for creating a container.
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// Name for the container (engine-generated when `None`).
    pub name: Option<String>,
    /// Image to run.
    pub image: ImageRef,
    /// Command to run (overrides image CMD).
    pub command: Option<Vec<String>>,
    /// Entrypoint (overrides image ENTRYPOINT).
    pub entrypoint: Option<Vec<String>>,
    /// Environment variables.
    pub env: HashMap<String, String>,
    /// Labels to apply.
    pub labels: HashMap<String, String>,
    /// Bind mounts in `host:container[:mode]` form.
    pub binds: Vec<String>,
    /// Working directory.
    pub working_dir: Option<String>,
    /// User to run as.
    pub user: Option<String>,
    /// Allocate a TTY.
    pub tty: bool,
    /// Let the engine remove the container when it exits.
    pub auto_remove: bool,
}

impl ContainerConfig {
    /// A config that runs `image` with its default command.
    pub fn new(image: ImageRef) -> Self {
        Self {
            name: None,
            image,
            command: None,
            entrypoint: None,
            env: HashMap::new(),
            labels: HashMap::new(),
            binds: Vec::new(),
            working_dir: None,
            user: None,
            tty: false,
            auto_remove: false,
        }
    }
}

/// Registry authentication credentials.
#[derive(Debug, Clone)]
pub struct RegistryAuth {
    /// Username.
    pub username: String,
    /// Password or token.
    pub password: String,
    /// Registry server (e.g., "ghcr.io").
    pub server: Option<String>,
}

/// Engine version as reported by the version endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeVersion {
    /// Runtime name (e.g., "Docker", "Podman").
    pub name: String,
    /// Engine version.
    pub version: String,
    /// API version the engine speaks.
    pub api_version: String,
    /// Operating system.
    pub os: String,
    /// Architecture.
    pub arch: String,
    /// Kernel version.
    pub kernel_version: String,
}

/// One line of build output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildLog {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Exec configuration for running commands in containers.
#[derive(Debug, Clone)]
pub struct ExecConfig {
    /// Command and arguments to run.
    pub cmd: Vec<String>,
    /// Environment variables.
    pub env: Vec<String>,
    /// Working directory.
    pub working_dir: Option<String>,
    /// User to run as.
    pub user: Option<String>,
    /// Attach stdin.
    pub attach_stdin: bool,
    /// Attach stdout.
    pub attach_stdout: bool,
    /// Attach stderr.
    pub attach_stderr: bool,
    /// Allocate a TTY.
    pub tty: bool,
    /// Run in privileged mode.
    pub privileged: bool,
}

impl ExecConfig {
    /// Exec `cmd`, optionally from `working_dir`, capturing both streams.
    pub fn command(cmd: Vec<String>, working_dir: Option<String>) -> Self {
        Self {
            cmd,
            working_dir,
            ..Default::default()
        }
    }
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            cmd: Vec::new(),
            env: Vec::new(),
            working_dir: None,
            user: None,
            attach_stdin: false,
            attach_stdout: true,
            attach_stderr: true,
            tty: false,
            privileged: false,
        }
    }
}

/// Result of an exec operation.
#[derive(Debug, Clone, Default)]
pub struct ExecResult {
    /// Exit code.
    pub exit_code: i64,
    /// Standard output.
    pub stdout: Vec<u8>,
    /// Standard error.
    pub stderr: Vec<u8>,
    /// Both streams interleaved in arrival order.
    pub output: Vec<u8>,
}

impl ExecResult {
    /// Combined output decoded as UTF-8 (lossy).
    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(&self.output).to_string()
    }
}

/// Exec instance information.
#[derive(Debug, Clone)]
pub struct ExecInfo {
    /// Whether the exec is running.
    pub running: bool,
    /// Exit code (if finished).
    pub exit_code: Option<i64>,
    /// Container ID.
    pub container_id: ContainerId,
}
