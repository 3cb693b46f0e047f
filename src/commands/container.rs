// ABOUTME: Container commands: list, inspect, lifecycle, logs, exec, create, and run.
// ABOUTME: Thin wrappers over ApiDocker and the Container handle.

use super::connect;
use crate::cli::ContainerCommand;
use dockside::error::{Error, Result};
use dockside::output::{Output, OutputMode};
use dockside::runtime::{ContainerError, ContainerFilters, ExecConfig};

pub async fn containers(
    all: bool,
    image: Option<String>,
    tag: Option<String>,
    output: &Output,
) -> Result<()> {
    let api = connect()?;

    let records = match image {
        Some(image) => {
            let tag = tag.as_deref().unwrap_or("");
            api.containers_all_with_image(&image, tag).await?
        }
        None if all => api.containers_all().await?,
        None => api.containers(&ContainerFilters::default()).await?,
    };

    if output.mode() == OutputMode::Normal {
        for record in &records {
            output.text(&format!(
                "{}  {:<10}  {:<30}  {}",
                record.id_short, record.status, record.image, record.name
            ));
        }
        return Ok(());
    }
    output.data(&records)
}

pub async fn container_command(command: ContainerCommand, output: &Output) -> Result<()> {
    let api = connect()?;

    match command {
        ContainerCommand::Info { id } => match api.container(&id).info().await? {
            Some(record) => output.data(&record),
            None => Err(ContainerError::NotFound(id).into()),
        },
        ContainerCommand::Status { id } => {
            output.text(api.container(&id).status().await?.as_str());
            Ok(())
        }
        ContainerCommand::Start { id, no_wait } => {
            let container = api.container(&id);
            if !container.start(!no_wait).await? {
                return Err(ContainerError::NotRunning(format!(
                    "{} did not reach running",
                    container
                ))
                .into());
            }
            output.success(&format!("Started {}", container.short_id()));
            Ok(())
        }
        ContainerCommand::Stop { id, no_wait } => {
            let container = api.container(&id);
            if !container.stop(!no_wait).await? {
                return Err(ContainerError::NotRunning(id).into());
            }
            output.success(&format!("Stopped {}", container.short_id()));
            Ok(())
        }
        ContainerCommand::Delete { id } => {
            let container = api.container(&id);
            if !container.delete().await? {
                return Err(ContainerError::Conflict(format!(
                    "{} is missing or still running",
                    id
                ))
                .into());
            }
            output.success(&format!("Deleted {}", container.short_id()));
            Ok(())
        }
        ContainerCommand::Logs { id } => {
            let container = api.container(&id);
            if !container.exists().await? {
                return Err(ContainerError::NotFound(id).into());
            }
            output.text(container.logs().await?.trim_end());
            Ok(())
        }
        ContainerCommand::Exec {
            id,
            workdir,
            command,
        } => {
            let result = api
                .container(&id)
                .exec_with(&ExecConfig::command(command, workdir))
                .await?;
            output.text(result.output_text().trim_end());
            if result.exit_code != 0 {
                return Err(Error::Exec(dockside::runtime::ExecError::Failed(format!(
                    "command exited with {}",
                    result.exit_code
                ))));
            }
            Ok(())
        }
    }
}

pub async fn create(
    image: &str,
    tag: &str,
    command: Option<&str>,
    volumes: &[String],
    tty: bool,
    output: &Output,
) -> Result<()> {
    let api = connect()?;
    let container = api
        .container_create(image, tag, command, volumes, tty)
        .await?;
    output.text(container.id().as_str());
    Ok(())
}

pub async fn run(
    image: &str,
    tag: &str,
    command: Option<&str>,
    rm: bool,
    output: &Output,
) -> Result<()> {
    let api = connect()?;
    let run = api.container_run(image, tag, command, rm).await?;

    match output.mode() {
        OutputMode::Json => output.data(&run)?,
        _ => output.text(&run.output),
    }

    if run.exit_code != 0 {
        return Err(ContainerError::Runtime(format!(
            "container {} exited with {}",
            &run.container_id[..run.container_id.len().min(12)],
            run.exit_code
        ))
        .into());
    }
    Ok(())
}
