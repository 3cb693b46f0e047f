// ABOUTME: Entry point for the dockside CLI application.
// ABOUTME: Parses arguments and dispatches to the command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use dockside::config;
use dockside::error::Result;
use dockside::output::Output;
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let mut output = Output::new(cli.output_mode());
    if let Err(e) = run(cli, &mut output).await {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &mut Output) -> Result<()> {
    match cli.command {
        Commands::Init { force } => {
            let cwd = env::current_dir()?;
            let path = config::init_config(&cwd, force)?;
            output.success(&format!("Wrote {}", path.display()));
            Ok(())
        }
        Commands::Version => commands::version(output).await,
        Commands::Info => commands::info(output).await,
        Commands::Images => commands::images(output).await,
        Commands::Image { command } => commands::image_command(command, output).await,
        Commands::Containers { all, image, tag } => {
            commands::containers(all, image, tag, output).await
        }
        Commands::Container { command } => commands::container_command(command, output).await,
        Commands::Create {
            image,
            tag,
            command,
            volumes,
            tty,
        } => {
            let tag = tag.as_deref().unwrap_or("");
            commands::create(&image, tag, command.as_deref(), &volumes, tty, output).await
        }
        Commands::Run {
            image,
            tag,
            command,
            rm,
        } => {
            let tag = tag.as_deref().unwrap_or("");
            commands::run(&image, tag, command.as_deref(), rm, output).await
        }
        Commands::DockerRun {
            params,
            options,
            entrypoint,
            bash,
        } => commands::docker_run(params, options, entrypoint, bash, output).await,
        Commands::Login { registry, username } => {
            commands::login(&registry, &username, output).await
        }
    }
}
