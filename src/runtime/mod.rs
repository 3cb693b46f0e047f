// ABOUTME: Container runtime layer: detection, capability traits, and the bollard client.
// ABOUTME: Docker and Podman are both reached through the Docker-compatible API.

mod bollard;
mod detection;
mod error;
#[cfg(test)]
pub(crate) mod fake;
pub mod traits;
mod types;

pub use bollard::BollardRuntime;
pub use detection::{DetectionError, detect, detect_local};
pub use error::{RuntimeError, RuntimeErrorKind};
pub use traits::{
    BuildLog, ContainerConfig, ContainerError, ContainerFilters, ContainerOps, ContainerSummary,
    ExecConfig, ExecError, ExecInfo, ExecOps, ExecResult, FullRuntime, ImageError, ImageOps,
    LogError, LogLine, LogLineStream, LogOps, LogOptions, LogStream, RegistryAuth,
    RuntimeInfo as RuntimeInfoTrait, RuntimeInfoError, RuntimeVersion,
};
pub use types::{RuntimeConfig, RuntimeInfo, RuntimeType};

use std::sync::Arc;

/// A runtime shared between the façade and the handles it hands out.
pub type SharedRuntime = Arc<dyn FullRuntime>;

/// Detect the local runtime (honouring `config`) and connect to it.
pub fn connect(config: Option<&RuntimeConfig>) -> Result<BollardRuntime, RuntimeError> {
    let info = detect(config)?;
    tracing::debug!("using {} at {}", info.runtime_type, info.socket_path);
    Ok(BollardRuntime::connect(&info)?)
}
