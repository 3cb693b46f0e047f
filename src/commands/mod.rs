// ABOUTME: Command module aggregator for the dockside CLI.
// ABOUTME: Re-exports the engine, image, container, and CLI shell-out handlers.

mod connect;
mod container;
mod engine;
mod image;
mod shell;

pub use connect::{connect, load_settings};
pub use container::{container_command, containers, create, run};
pub use engine::{info, version};
pub use image::{image_command, images};
pub use shell::{docker_run, login};
