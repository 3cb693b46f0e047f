// ABOUTME: Commands that shell out to the engine's CLI binary: docker-run and login.
// ABOUTME: The binary follows the detected runtime unless dockside.yml names one.

use super::load_settings;
use dockside::docker_cli::{CliError, DEFAULT_BASH, DockerCli, RunOption};
use dockside::error::{Error, Result};
use dockside::output::Output;
use dockside::runtime::{RuntimeType, detect};
use std::io::Read;

fn cli() -> Result<DockerCli> {
    let settings = load_settings()?;
    let runtime_type = settings
        .runtime
        .runtime
        .or_else(|| {
            detect(settings.runtime_override())
                .ok()
                .map(|info| info.runtime_type)
        })
        .unwrap_or(RuntimeType::Docker);
    Ok(DockerCli::from_settings(&settings.cli, runtime_type))
}

pub async fn docker_run(
    params: Vec<String>,
    options: Vec<RunOption>,
    entrypoint: Option<String>,
    bash: bool,
    output: &Output,
) -> Result<()> {
    let cli = cli()?;

    let result = if bash {
        let (image, command) = params
            .split_first()
            .ok_or_else(|| Error::InvalidCommand(String::new(), "no image given".to_string()))?;
        cli.run_bash(image, command, &options, DEFAULT_BASH).await?
    } else if let Some(entrypoint) = entrypoint {
        cli.run_entrypoint(&entrypoint, &params, &options).await?
    } else {
        cli.run(&params, &options).await?
    };

    output.text(result.stdout.trim_end());
    if !result.stderr.trim().is_empty() {
        eprintln!("{}", result.stderr.trim_end());
    }

    if !result.success() {
        return Err(CliError::Failed {
            binary: cli.binary().to_string(),
            command: "run".to_string(),
            code: result.exit_code,
            stderr: result.stderr.trim().to_string(),
        }
        .into());
    }
    Ok(())
}

pub async fn login(registry: &str, username: &str, output: &Output) -> Result<()> {
    let password = match std::env::var("DOCKSIDE_PASSWORD") {
        Ok(password) => password,
        Err(_) => {
            let mut password = String::new();
            std::io::stdin().read_to_string(&mut password)?;
            password.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    cli()?.login(registry, username, &password).await?;
    output.success(&format!("Logged in to {} as {}", registry, username));
    Ok(())
}
