// ABOUTME: Runtime detection logic for the local system.
// ABOUTME: Honours DOCKER_HOST, then checks the Docker socket, then Podman.

use super::types::{RuntimeConfig, RuntimeInfo, RuntimeType};
use std::path::Path;

/// Error during runtime detection.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("no container runtime found (checked DOCKER_HOST, Podman and Docker sockets)")]
    NoRuntimeFound,

    #[error("unsupported DOCKER_HOST scheme: {0}")]
    UnsupportedHost(String),
}

const ROOTFUL_PODMAN: &str = "/run/podman/podman.sock";
const DOCKER_SOCKET: &str = "/var/run/docker.sock";

/// Detect container runtime on the local system.
///
/// Detection order:
/// 1. `DOCKER_HOST` (`unix://` or `tcp://`)
/// 2. Docker socket (`/var/run/docker.sock`)
/// 3. Rootless Podman socket (`/run/user/$UID/podman/podman.sock`)
/// 4. Rootful Podman socket (`/run/podman/podman.sock`)
pub fn detect_local() -> Result<RuntimeInfo, DetectionError> {
    detect(None)
}

/// Detect the local runtime, letting `config` override any part of it.
pub fn detect(config: Option<&RuntimeConfig>) -> Result<RuntimeInfo, DetectionError> {
    detect_with(
        config,
        std::env::var("DOCKER_HOST").ok(),
        get_uid(),
        |path| Path::new(path).exists(),
    )
}

/// Detection with its environment passed in.
pub(crate) fn detect_with(
    config: Option<&RuntimeConfig>,
    docker_host: Option<String>,
    uid: Option<String>,
    exists: impl Fn(&str) -> bool,
) -> Result<RuntimeInfo, DetectionError> {
    if let Some(cfg) = config {
        match (cfg.runtime, cfg.socket.as_ref()) {
            (Some(runtime_type), socket) => {
                return Ok(RuntimeInfo {
                    runtime_type,
                    socket_path: socket
                        .cloned()
                        .unwrap_or_else(|| default_socket_path(runtime_type)),
                });
            }
            (None, Some(socket)) => {
                return Ok(RuntimeInfo {
                    runtime_type: guess_runtime(socket),
                    socket_path: socket.clone(),
                });
            }
            (None, None) => {}
        }
    }

    if let Some(host) = docker_host.filter(|h| !h.trim().is_empty()) {
        return parse_docker_host(&host);
    }

    if exists(DOCKER_SOCKET) {
        return Ok(RuntimeInfo {
            runtime_type: RuntimeType::Docker,
            socket_path: DOCKER_SOCKET.to_string(),
        });
    }

    if let Some(uid) = uid {
        let rootless_socket = format!("/run/user/{}/podman/podman.sock", uid);
        if exists(&rootless_socket) {
            return Ok(RuntimeInfo {
                runtime_type: RuntimeType::Podman,
                socket_path: rootless_socket,
            });
        }
    }

    if exists(ROOTFUL_PODMAN) {
        return Ok(RuntimeInfo {
            runtime_type: RuntimeType::Podman,
            socket_path: ROOTFUL_PODMAN.to_string(),
        });
    }

    Err(DetectionError::NoRuntimeFound)
}

fn parse_docker_host(host: &str) -> Result<RuntimeInfo, DetectionError> {
    let host = host.trim();
    if let Some(path) = host.strip_prefix("unix://") {
        return Ok(RuntimeInfo {
            runtime_type: guess_runtime(path),
            socket_path: path.to_string(),
        });
    }
    if host.starts_with("tcp://") || host.starts_with("http://") {
        return Ok(RuntimeInfo {
            runtime_type: RuntimeType::Docker,
            socket_path: host.to_string(),
        });
    }
    Err(DetectionError::UnsupportedHost(host.to_string()))
}

fn guess_runtime(socket: &str) -> RuntimeType {
    if socket.contains("podman") {
        RuntimeType::Podman
    } else {
        RuntimeType::Docker
    }
}

fn get_uid() -> Option<String> {
    std::env::var("UID").ok().or_else(|| {
        std::fs::read_to_string("/proc/self/status")
            .ok()
            .and_then(|s| {
                s.lines()
                    .find(|l| l.starts_with("Uid:"))
                    .and_then(|l| l.split_whitespace().nth(1))
                    .map(|s| s.to_string())
            })
    })
}

fn default_socket_path(runtime: RuntimeType) -> String {
    match runtime {
        RuntimeType::Docker => DOCKER_SOCKET.to_string(),
        RuntimeType::Podman => ROOTFUL_PODMAN.to_string(),
    }
}
