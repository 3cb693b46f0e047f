// ABOUTME: Application-wide error types for dockside.
// ABOUTME: Wraps the per-capability runtime errors, CLI failures, and config errors.

use crate::docker_cli::CliError;
use crate::runtime::{
    ContainerError, ExecError, ImageError, LogError, RuntimeError, RuntimeInfoError,
};
use crate::types::ParseImageRefError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid image reference: {0}")]
    InvalidImage(#[from] ParseImageRefError),

    #[error("invalid command {0:?}: {1}")]
    InvalidCommand(String, String),

    #[error("invalid build context: {0}")]
    BuildContext(String),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Log(#[from] LogError),

    #[error(transparent)]
    RuntimeInfo(#[from] RuntimeInfoError),

    #[error(transparent)]
    Cli(#[from] CliError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
