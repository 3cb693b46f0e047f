// ABOUTME: Library root for dockside - a façade over the Docker/Podman API and CLI.
// ABOUTME: The main binary is in main.rs.

pub mod api;
pub mod build_context;
pub mod config;
pub mod container;
pub mod docker_cli;
pub mod error;
pub mod image;
pub mod output;
pub mod records;
pub mod runtime;
pub mod types;

pub use api::{ApiDocker, RunOutput};
pub use container::Container;
pub use image::{BuildOutcome, Image};
