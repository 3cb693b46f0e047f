// ABOUTME: Composable capability traits for container runtimes.
// ABOUTME: Defines ImageOps, ContainerOps, ExecOps, LogOps, RuntimeInfo, and FullRuntime.

mod container;
mod exec;
mod image;
mod logs;
mod runtime_info;
pub(crate) mod sealed;
mod shared_types;

pub use container::{ContainerError, ContainerFilters, ContainerOps, ContainerSummary};
pub use exec::{ExecError, ExecOps};
pub use image::{ImageError, ImageOps};
pub use logs::{LogError, LogLine, LogLineStream, LogOps, LogOptions, LogStream};
pub use runtime_info::{RuntimeInfo, RuntimeInfoError};
pub use shared_types::*;

/// Every capability the façade needs from an engine.
pub trait FullRuntime: ImageOps + ContainerOps + ExecOps + LogOps + RuntimeInfo {}

impl<T> FullRuntime for T where T: ImageOps + ContainerOps + ExecOps + LogOps + RuntimeInfo {}
