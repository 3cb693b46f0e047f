// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use dockside::docker_cli::RunOption;
use dockside::output::OutputMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dockside")]
#[command(about = "Inspect and drive Docker or Podman containers and images")]
#[command(version)]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Print JSON lines instead of human-readable output
    #[arg(long, global = true, conflicts_with = "quiet")]
    pub json: bool,

    /// Print only results
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a dockside.yml with the default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the engine's version
    Version,

    /// Show the engine's system information
    Info,

    /// List local images
    Images,

    /// Work with one image
    Image {
        #[command(subcommand)]
        command: ImageCommand,
    },

    /// List containers
    Containers {
        /// Include stopped containers
        #[arg(short, long)]
        all: bool,

        /// Only containers created from this image (implies --all)
        #[arg(long)]
        image: Option<String>,

        /// Tag for --image (default: latest)
        #[arg(long)]
        tag: Option<String>,
    },

    /// Work with one container
    Container {
        #[command(subcommand)]
        command: ContainerCommand,
    },

    /// Create a container without starting it
    Create {
        image: String,

        /// Tag, unless the image name carries one (default: latest)
        #[arg(long)]
        tag: Option<String>,

        /// Command to run, split like a shell would
        #[arg(long)]
        command: Option<String>,

        /// Bind mount, e.g. /host/dir:/data:ro (repeatable)
        #[arg(short = 'v', long = "volume")]
        volumes: Vec<String>,

        /// Allocate a TTY
        #[arg(short, long)]
        tty: bool,
    },

    /// Run a container to completion and print its output
    Run {
        image: String,

        /// Tag, unless the image name carries one (default: latest)
        #[arg(long)]
        tag: Option<String>,

        /// Command to run, split like a shell would
        #[arg(long)]
        command: Option<String>,

        /// Remove the container afterwards
        #[arg(long)]
        rm: bool,
    },

    /// Run a throwaway container through the engine's CLI
    DockerRun {
        /// Image, followed by its arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        params: Vec<String>,

        /// Extra run option as KEY=VALUE, e.g. -o -v=/tmp:/data (repeatable)
        #[arg(
            short = 'o',
            long = "option",
            value_parser = parse_run_option,
            allow_hyphen_values = true
        )]
        options: Vec<RunOption>,

        /// Override the image's entrypoint
        #[arg(long, conflicts_with = "bash")]
        entrypoint: Option<String>,

        /// Run the arguments through bash -c
        #[arg(long)]
        bash: bool,
    },

    /// Log in to a registry (password from DOCKSIDE_PASSWORD or stdin)
    Login {
        registry: String,

        #[arg(short, long)]
        username: String,
    },
}

#[derive(Args)]
pub struct ImageTarget {
    pub name: String,

    /// Tag, unless the name carries one (default: latest)
    #[arg(long)]
    pub tag: Option<String>,
}

#[derive(Subcommand)]
pub enum ImageCommand {
    /// Show image details
    Info(ImageTarget),
    /// Pull from the registry
    Pull(ImageTarget),
    /// Push to the registry
    Push(ImageTarget),
    /// Remove the local image
    Delete(ImageTarget),
    /// Build a directory containing a Dockerfile
    Build {
        #[command(flatten)]
        target: ImageTarget,

        #[arg(long)]
        path: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum ContainerCommand {
    /// Show container details
    Info { id: String },
    /// Show the container's status
    Status { id: String },
    /// Start the container
    Start {
        id: String,
        /// Return without waiting for it to be running
        #[arg(long)]
        no_wait: bool,
    },
    /// Stop the container
    Stop {
        id: String,
        /// Return without waiting for it to exit
        #[arg(long)]
        no_wait: bool,
    },
    /// Remove a stopped container
    Delete { id: String },
    /// Print the container's logs
    Logs { id: String },
    /// Run a command inside the running container
    Exec {
        id: String,

        #[arg(short, long)]
        workdir: Option<String>,

        #[arg(last = true, required = true)]
        command: Vec<String>,
    },
}

/// Parse `KEY=VALUE`, splitting at the first `=`.
fn parse_run_option(s: &str) -> Result<RunOption, String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok(RunOption::new(key, value)),
        _ => Err(format!("expected KEY=VALUE, got {s:?}")),
    }
}
